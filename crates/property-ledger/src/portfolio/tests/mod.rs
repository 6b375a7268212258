mod common;

mod notifications;
mod reports;
