pub mod message;
pub mod progress_bar;
pub mod prompt;
pub mod scrollable_list;
