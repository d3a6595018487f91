mod dispatcher;
mod error;
pub mod mailer;

pub use dispatcher::Dispatcher;
pub use error::NotifyError;
pub use mailer::SmtpMailer;
