use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AdvisorError;

static PROFILE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"User/Profile/([0-9]+)/([0-9]+)").expect("profile path pattern is valid")
});

/// Platform + account pair parsed out of a Bungie.net profile link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    platform_type: String,
    membership_id: String,
}

impl PlayerIdentity {
    pub fn platform_type(&self) -> &str {
        &self.platform_type
    }

    pub fn membership_id(&self) -> &str {
        &self.membership_id
    }

    pub fn platform_name(&self) -> &'static str {
        match self.platform_type.parse::<u32>() {
            Ok(1) => "Xbox",
            Ok(2) => "PlayStation",
            Ok(3) => "Steam",
            Ok(4) => "Battle.net",
            Ok(5) => "Stadia",
            Ok(6) => "Epic Games",
            Ok(10) => "Demon",
            Ok(254) => "Bungie.net",
            _ => "Unknown",
        }
    }
}

/// Finds the first `User/Profile/<platform>/<id>` run in `url`. Surrounding
/// text, scheme and host are ignored.
pub fn resolve_profile_url(url: &str) -> Result<PlayerIdentity, AdvisorError> {
    let caps = PROFILE_PATH.captures(url).ok_or_else(|| {
        AdvisorError::InvalidProfileUrl(
            "expected a link like https://www.bungie.net/7/en/User/Profile/<platform>/<id>"
                .to_string(),
        )
    })?;

    Ok(PlayerIdentity {
        platform_type: caps[1].to_string(),
        membership_id: caps[2].to_string(),
    })
}
