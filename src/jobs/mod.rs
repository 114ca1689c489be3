pub mod badge_poller;
