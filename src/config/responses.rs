use crate::error::LuminaryError;
use log::info;
use serde::{ Deserialize, Serialize };
use std::collections::HashMap;
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::SystemTime;

pub const TELL_ME_A_FACT: &str = "Tell me a fact";
pub const GIVE_ME_ADVICE: &str = "Give me advice";
pub const SHARE_A_QUOTE: &str = "Share a quote";

const GREETING: &str = "Hello! I'm here to help. What would you like to talk about?";
const TEXT_ACKNOWLEDGEMENT: &str = "Thanks for your message! Please select one of these options:";
const FOLLOW_UP: &str = "Thanks for selecting an option! Please select another:";

const FACT_REPLY: &str =
    "Did you know that honey never spoils? Archaeologists have found pots of honey in ancient Egyptian tombs that are over 3,000 years old and still perfectly good to eat!";
const ADVICE_REPLY: &str =
    "When learning something new, try teaching it to someone else. This 'Feynman Technique' helps reinforce your understanding and identify gaps in your knowledge.";
const QUOTE_REPLY: &str =
    "\"The greatest glory in living lies not in never falling, but in rising every time we fall.\" \u{2014} Nelson Mandela";

/// Everything the assistant can say. The built-in catalog is the three-option
/// menu; a JSON file with the same shape may replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCatalog {
    pub greeting: String,
    pub text_acknowledgement: String,
    pub follow_up: String,
    pub options: Vec<String>,
    pub replies: HashMap<String, String>,
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        let replies = [
            (TELL_ME_A_FACT, FACT_REPLY),
            (GIVE_ME_ADVICE, ADVICE_REPLY),
            (SHARE_A_QUOTE, QUOTE_REPLY),
        ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            greeting: GREETING.to_string(),
            text_acknowledgement: TEXT_ACKNOWLEDGEMENT.to_string(),
            follow_up: FOLLOW_UP.to_string(),
            options: vec![
                TELL_ME_A_FACT.to_string(),
                GIVE_ME_ADVICE.to_string(),
                SHARE_A_QUOTE.to_string()
            ],
            replies,
        }
    }
}

impl ResponseCatalog {
    /// Canned reply for an option. Unknown options get an empty reply.
    pub fn reply_for(&self, option: &str) -> String {
        self.replies.get(option).cloned().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), LuminaryError> {
        if self.options.is_empty() {
            return Err(LuminaryError::InvalidCatalog("options must not be empty".to_string()));
        }
        if self.greeting.trim().is_empty() {
            return Err(LuminaryError::InvalidCatalog("greeting must not be empty".to_string()));
        }
        if let Some(missing) = self.options.iter().find(|o| !self.replies.contains_key(*o)) {
            return Err(
                LuminaryError::InvalidCatalog(format!("no reply defined for option '{}'", missing))
            );
        }
        Ok(())
    }
}

pub fn load_responses<P: AsRef<Path>>(path: P) -> Result<ResponseCatalog, LuminaryError> {
    let file_content = fs::read_to_string(&path)?;
    let catalog: ResponseCatalog = serde_json::from_str(&file_content)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Where the active catalog comes from: the built-in table, or a file that is
/// re-read when its modification time moves past the last load.
#[derive(Debug)]
pub struct CatalogSource {
    path: Option<PathBuf>,
    current: Arc<ResponseCatalog>,
    last_loaded: Option<SystemTime>,
}

impl CatalogSource {
    pub fn builtin() -> Self {
        Self {
            path: None,
            current: Arc::new(ResponseCatalog::default()),
            last_loaded: None,
        }
    }

    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, LuminaryError> {
        let path = path.into();
        let catalog = load_responses(&path)?;
        info!("Loaded response catalog from {}", path.display());
        Ok(Self {
            path: Some(path),
            current: Arc::new(catalog),
            last_loaded: Some(SystemTime::now()),
        })
    }

    pub fn current(&self) -> Arc<ResponseCatalog> {
        Arc::clone(&self.current)
    }

    /// Returns true when a newer file was loaded.
    pub fn reload_if_changed(&mut self) -> Result<bool, LuminaryError> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => {
                return Ok(false);
            }
        };

        let modified = fs::metadata(&path)?.modified()?;
        let stale = match self.last_loaded {
            Some(last_loaded) => modified > last_loaded,
            None => true,
        };
        if !stale {
            return Ok(false);
        }

        info!("Response catalog {} changed, reloading...", path.display());
        self.current = Arc::new(load_responses(&path)?);
        self.last_loaded = Some(SystemTime::now());
        Ok(true)
    }
}
