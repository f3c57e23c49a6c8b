mod filter_bar;
mod nav_bar;
mod notice_stack;
mod stats_panel;
mod task_card;
mod task_modal;

pub use filter_bar::FilterBar;
pub use nav_bar::NavBar;
pub use notice_stack::NoticeStack;
pub use stats_panel::StatsPanel;
pub use task_card::TaskCard;
pub use task_modal::TaskModal;
