use dialoguer::{Password, Select};
use tracing::debug;

use mifare::pcsc::PcscTransport;
use mifare::{Key, Session};

use crate::{CardArgs, Result};

const DEFAULT_KEY: &str = "FFFFFFFFFFFF";

/// Resolves the key, then connects to the card in the chosen reader.
pub(crate) fn connect(session: &mut Session<PcscTransport>, card: &CardArgs) -> Result<Key> {
    let key = match &card.key {
        Some(key) => key.clone(),
        None => Password::new()
            .with_prompt(format!("Key (hex, empty for {})", DEFAULT_KEY))
            .allow_empty_password(true)
            .interact()?,
    };
    let key: Key = match key.trim() {
        "" => DEFAULT_KEY,
        k => k,
    }
    .parse()?;

    let reader = match &card.reader {
        Some(reader) => reader.clone(),
        None => select(session)?,
    };

    let protocol = session.connect(&reader)?;
    debug!("Using {} over {}", reader, protocol);

    Ok(key)
}

fn select(session: &Session<PcscTransport>) -> Result<String> {
    let mut readers = session.list_readers()?;
    if readers.len() == 1 {
        return Ok(readers.remove(0));
    }

    let index = Select::new()
        .with_prompt("Reader")
        .items(&readers)
        .default(0)
        .interact()?;

    Ok(readers.swap_remove(index))
}
