pub mod verify;

pub use verify::verify_cron_secret;
