mod config_multibox;

pub use config_multibox::ConfigMultibox;
