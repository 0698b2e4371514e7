//! External collaborators used by the Switchboard tools: weather and news
//! HTTP APIs, SMTP delivery, and PDF text extraction.
//!
//! Each collaborator is an object-safe async trait with one production
//! adapter and one recording mock.

pub mod document;
pub mod mail;
pub mod news;
pub mod weather;

pub use document::{
    DocumentError, DocumentExtractor, ExtractedDocument, LopdfExtractor, MockDocumentExtractor,
};
pub use mail::{MailError, MailTransport, MockMailTransport, OutgoingMail, SmtpCredentials, SmtpMailer};
pub use news::{Headline, MockNewsService, NewsApiClient, NewsCall, NewsError, NewsService};
pub use weather::{CurrentWeather, MockWeatherService, WeatherApiClient, WeatherError, WeatherService};
