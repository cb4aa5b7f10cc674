use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::Error;
use crate::config::paths;
use crate::model::profile::AccountProfile;

/// Profiles from the default location; a missing file means none.
pub fn load_profiles() -> Result<Vec<AccountProfile>, Error> {
    let path = paths::profiles_file().ok_or(Error::NoConfigDir)?;
    load_profiles_from(&path)
}

pub fn load_profiles_from(path: &Path) -> Result<Vec<AccountProfile>, Error> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(path.display(), e)),
    };
    Ok(serde_json::from_str(&data)?)
}

/// The named profile, or the first stored one when no name is given.
/// `None` only when nothing is stored and no name was asked for.
pub fn select(profiles: &[AccountProfile], name: Option<&str>) -> Result<Option<AccountProfile>, Error> {
    match name {
        Some(name) => profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::UnknownProfile(name.to_string())),
        None => Ok(profiles.first().cloned()),
    }
}
