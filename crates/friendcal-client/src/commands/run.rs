//! The full pipeline: login, fetch, project, write.

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use friendcal_core::{BirthdayCalendar, BirthdaySet, CalendarMetadata};
use friendcal_providers::{BirthdaySource, FacebookClient, ReqwestSession, fetch_birthdays};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Command-line overrides for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub stdout: bool,
    pub source: Option<BirthdaySource>,
}

/// Where the rendered calendar goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// `--stdout` wins, then `--output`, then the configured file unless
    /// `save_to_file` is off.
    pub fn select(config: &ClientConfig, options: &RunOptions) -> Self {
        if options.stdout {
            Self::Stdout
        } else if let Some(ref path) = options.output {
            Self::File(path.clone())
        } else if config.output.save_to_file {
            Self::File(config.output.resolved_path())
        } else {
            Self::Stdout
        }
    }
}

/// Runs the whole pipeline against Facebook.
pub async fn run(config: &ClientConfig, options: RunOptions) -> ClientResult<()> {
    let today = Local::now().date_naive();
    let target = OutputTarget::select(config, &options);

    let credentials = config
        .auth
        .resolve_credentials()
        .map_err(ClientError::Secret)?;
    let mut facebook = config
        .facebook
        .to_provider_config()
        .map_err(ClientError::Config)?;
    if let Some(source) = options.source {
        facebook = facebook.with_source(source);
    }

    info!(source = %facebook.source, "starting friendcal");
    let session = ReqwestSession::new(&facebook.user_agent, facebook.timeout)?;
    let mut client = FacebookClient::new(session, facebook);
    client
        .login(&credentials.email, &credentials.password)
        .await?;

    let birthdays = fetch_birthdays(&mut client, today).await?;
    let calendar = project(&birthdays, today, config)?;
    emit(&calendar, &target)
}

/// Projects the collected birthdays with the configured calendar name.
pub fn project(
    birthdays: &BirthdaySet,
    today: NaiveDate,
    config: &ClientConfig,
) -> ClientResult<BirthdayCalendar> {
    let metadata = CalendarMetadata::default().with_name(&config.output.calendar_name);
    Ok(BirthdayCalendar::project(birthdays.sorted(), today, metadata)?)
}

/// Writes the calendar to its target.
pub fn emit(calendar: &BirthdayCalendar, target: &OutputTarget) -> ClientResult<()> {
    match target {
        OutputTarget::File(path) => {
            calendar.write_to(path)?;
            println!("{} birthdays written to {}", calendar.events().len(), path.display());
        }
        OutputTarget::Stdout => {
            let ics = calendar.to_ics();
            debug!(bytes = ics.len(), "writing calendar to stdout");
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(ics.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use friendcal_core::Person;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 12, 1).unwrap()
    }

    fn birthdays() -> BirthdaySet {
        [
            Person::new("2", "Bob Jones", 24, 5).unwrap(),
            Person::new("1", "Ann Lee", 3, 1).unwrap().with_year(Some(1990)),
        ]
        .into_iter()
        .collect()
    }

    mod target {
        use super::*;

        #[test]
        fn stdout_flag_wins() {
            let options = RunOptions {
                stdout: true,
                output: Some(PathBuf::from("/tmp/x.ics")),
                ..Default::default()
            };
            assert_eq!(
                OutputTarget::select(&ClientConfig::default(), &options),
                OutputTarget::Stdout
            );
        }

        #[test]
        fn output_flag_overrides_config() {
            let options = RunOptions {
                output: Some(PathBuf::from("/tmp/x.ics")),
                ..Default::default()
            };
            assert_eq!(
                OutputTarget::select(&ClientConfig::default(), &options),
                OutputTarget::File(PathBuf::from("/tmp/x.ics"))
            );
        }

        #[test]
        fn save_to_file_off_prints() {
            let mut config = ClientConfig::default();
            config.output.save_to_file = false;
            assert_eq!(
                OutputTarget::select(&config, &RunOptions::default()),
                OutputTarget::Stdout
            );
        }

        #[test]
        fn configured_path_by_default() {
            let mut config = ClientConfig::default();
            config.output.path = "/srv/cal/b.ics".to_string();
            assert_eq!(
                OutputTarget::select(&config, &RunOptions::default()),
                OutputTarget::File(PathBuf::from("/srv/cal/b.ics"))
            );
        }
    }

    mod output {
        use super::*;

        #[test]
        fn projection_uses_calendar_name_and_birthday_order() {
            let mut config = ClientConfig::default();
            config.output.calendar_name = "Friends".to_string();
            let calendar = project(&birthdays(), today(), &config).unwrap();

            assert_eq!(calendar.metadata().name, "Friends");
            let uids: Vec<&str> = calendar.events().iter().map(|e| e.uid.as_str()).collect();
            assert_eq!(uids, ["1", "2"]);
        }

        #[test]
        fn file_target_creates_directories() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("birthdays.ics");
            let calendar = project(&birthdays(), today(), &ClientConfig::default()).unwrap();

            emit(&calendar, &OutputTarget::File(path.clone())).unwrap();

            let written = std::fs::read_to_string(&path).unwrap();
            assert!(written.starts_with("BEGIN:VCALENDAR\r\n"));
            assert!(written.contains("X-WR-CALNAME:Facebook Birthdays (friendcal)\r\n"));
            assert!(written.contains("SUMMARY:Bob Jones' Birthday"));
        }

        #[test]
        fn unwritable_target_is_core_error() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("file");
            std::fs::write(&blocker, "x").unwrap();
            let calendar = project(&birthdays(), today(), &ClientConfig::default()).unwrap();

            let err = emit(&calendar, &OutputTarget::File(blocker.join("b.ics"))).unwrap_err();
            assert!(matches!(err, ClientError::Core(_)));
        }
    }
}
