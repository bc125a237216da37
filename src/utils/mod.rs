pub mod context;
pub mod cron;
pub mod locker;
pub mod shutdown;
