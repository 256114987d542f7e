//! Identity resolution: turning operator input into canonical identity keys and
//! backend records.

mod credential;
mod record;

pub use credential::{collect_credentials, load_credentials, normalize, parse_credential_line, Credential, RECOGNIZED_SUFFIXES};
pub use record::{bare_record_id, extract_key_and_alias, resolve, select_first, IdentityRecord};
