//! Business services for dopo-web

pub mod calendar;
pub mod email;
pub mod purge;
pub mod reminders;
pub mod sitemap;
pub mod submission;

pub use calendar::{CalendarSource, GoogleCalendar};
pub use email::{EmailSender, MailjetSender};
pub use purge::{CachePurger, CloudflarePurger};
pub use reminders::ReminderDispatcher;
