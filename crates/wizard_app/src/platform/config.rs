use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use wizard_core::{DebouncePolicy, FormDefinition, DEFAULT_QUIET_PERIOD};
use wizard_engine::ApiSettings;

use super::logging::LogDestination;

const USAGE: &str = "usage: wizard_app post\n       \
                     wizard_app apply <job_id> --description <text> [--question <text>]...";

/// Which wizard to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormChoice {
    Post,
    Apply {
        job_id: u64,
        description: String,
        questions: Vec<String>,
    },
}

/// Application configuration loaded from the command line and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub form: FormChoice,
    pub api: ApiSettings,
    pub quiet_period: Duration,
    pub debounce_policy: DebouncePolicy,
    pub draft_dir: PathBuf,
    pub log: LogDestination,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_sources(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }

    pub(crate) fn from_sources<F, I>(env: F, args: I) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let form = parse_args(args)?;

        let mut api = ApiSettings {
            base_url: env("BOARD_API_BASE")
                .context("Required environment variable 'BOARD_API_BASE' is not set")?,
            auth_token: env("BOARD_API_TOKEN").filter(|token| !token.trim().is_empty()),
            ..ApiSettings::default()
        };
        if let Some(ms) = env("BOARD_REQUEST_TIMEOUT_MS") {
            api.request_timeout = parse_millis("BOARD_REQUEST_TIMEOUT_MS", &ms)?;
        }

        let quiet_period = match env("BOARD_QUIET_PERIOD_MS") {
            Some(ms) => parse_millis("BOARD_QUIET_PERIOD_MS", &ms)?,
            None => DEFAULT_QUIET_PERIOD,
        };
        let debounce_policy = match env("BOARD_DEBOUNCE_POLICY") {
            Some(policy) => parse_policy(&policy)?,
            None => DebouncePolicy::default(),
        };
        let log = match env("BOARD_LOG") {
            Some(destination) => destination.parse()?,
            None => LogDestination::default(),
        };

        Ok(Self {
            form,
            api,
            quiet_period,
            debounce_policy,
            draft_dir: env("BOARD_DRAFT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./drafts")),
            log,
        })
    }

    pub fn definition(&self) -> FormDefinition {
        let definition = match &self.form {
            FormChoice::Post => FormDefinition::job_posting(),
            FormChoice::Apply {
                job_id,
                description,
                questions,
            } => FormDefinition::job_application(*job_id, description, questions.clone()),
        };
        definition.with_debounce(self.debounce_policy, self.quiet_period)
    }
}

fn parse_args<I>(args: I) -> Result<FormChoice>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    match args.next().as_deref() {
        Some("post") => {
            if let Some(extra) = args.next() {
                bail!("unexpected argument {extra:?}\n{USAGE}");
            }
            Ok(FormChoice::Post)
        }
        Some("apply") => {
            let job_id = args
                .next()
                .with_context(|| format!("missing job id\n{USAGE}"))?;
            let job_id = job_id
                .parse::<u64>()
                .with_context(|| format!("job id must be a number, got {job_id:?}"))?;
            let mut description = None;
            let mut questions = Vec::new();
            while let Some(flag) = args.next() {
                let value = args
                    .next()
                    .with_context(|| format!("{flag} needs a value\n{USAGE}"))?;
                match flag.as_str() {
                    "--description" => description = Some(value),
                    "--question" => questions.push(value),
                    other => bail!("unknown option {other:?}\n{USAGE}"),
                }
            }
            Ok(FormChoice::Apply {
                job_id,
                description: description
                    .with_context(|| format!("--description is required\n{USAGE}"))?,
                questions,
            })
        }
        Some(other) => bail!("unknown form {other:?}\n{USAGE}"),
        None => bail!("{USAGE}"),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    let ms = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a number of milliseconds"))?;
    Ok(Duration::from_millis(ms))
}

fn parse_policy(value: &str) -> Result<DebouncePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "shared" => Ok(DebouncePolicy::SharedGate),
        "per-field" | "per_field" => Ok(DebouncePolicy::PerField),
        other => bail!("BOARD_DEBOUNCE_POLICY must be shared or per-field, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use wizard_core::FormKind;

    use super::*;

    fn load(vars: &[(&str, &str)], args: &[&str]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_sources(
            |key| vars.get(key).cloned(),
            args.iter().map(|arg| arg.to_string()),
        )
    }

    #[test]
    fn defaults_apply_when_only_base_is_set() {
        let config = load(&[("BOARD_API_BASE", "https://jobs.example.com")], &["post"]).unwrap();
        assert_eq!(config.form, FormChoice::Post);
        assert_eq!(config.api.base_url, "https://jobs.example.com");
        assert_eq!(config.api.auth_token, None);
        assert_eq!(config.api.request_timeout, Duration::from_secs(10));
        assert_eq!(config.quiet_period, Duration::from_secs(2));
        assert_eq!(config.debounce_policy, DebouncePolicy::SharedGate);
        assert_eq!(config.draft_dir, PathBuf::from("./drafts"));
        assert_eq!(config.log, LogDestination::File);
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = load(&[], &["post"]).unwrap_err();
        assert!(err.to_string().contains("BOARD_API_BASE"));
    }

    #[test]
    fn apply_reads_description_and_questions() {
        let config = load(
            &[
                ("BOARD_API_BASE", "http://localhost:8000"),
                ("BOARD_DEBOUNCE_POLICY", "per-field"),
                ("BOARD_QUIET_PERIOD_MS", "500"),
            ],
            &[
                "apply",
                "42",
                "--description",
                "Answer phones",
                "--question",
                "Why us?",
                "--question",
                "Start date?",
            ],
        )
        .unwrap();
        assert_eq!(
            config.form,
            FormChoice::Apply {
                job_id: 42,
                description: "Answer phones".to_string(),
                questions: vec!["Why us?".to_string(), "Start date?".to_string()],
            }
        );
        let definition = config.definition();
        assert_eq!(definition.kind(), FormKind::JobApplication { job_id: 42 });
        let scoring = definition.scoring().unwrap();
        assert_eq!(scoring.policy, DebouncePolicy::PerField);
        assert_eq!(scoring.quiet_period, Duration::from_millis(500));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let base = [("BOARD_API_BASE", "http://localhost:8000")];
        assert!(load(&base, &[]).is_err());
        assert!(load(&base, &["apply", "forty-two", "--description", "x"]).is_err());
        assert!(load(&base, &["apply", "42"]).is_err());
        assert!(load(&base, &["apply", "42", "--description"]).is_err());
        assert!(load(&base, &["post", "extra"]).is_err());
        assert!(load(
            &[
                ("BOARD_API_BASE", "http://localhost:8000"),
                ("BOARD_DEBOUNCE_POLICY", "sometimes")
            ],
            &["post"]
        )
        .is_err());
    }
}
