pub mod template_tracker;
