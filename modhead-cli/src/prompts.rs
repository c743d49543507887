use anyhow::Result;
use inquire::{Confirm, Text};

use modhead_core::{HeaderOverride, RequestProfile, UrlFilter};

/// Prompts the user for a new profile with its headers and URL filters
pub fn prompt_new_profile() -> Result<RequestProfile> {
    let name = Text::new("Profile name:").prompt()?;
    let mut profile = RequestProfile::new(name.trim());

    println!("Add headers (leave the name empty to finish)");
    loop {
        let header_name = Text::new("Header name:").prompt()?;
        if header_name.trim().is_empty() {
            break;
        }
        let value = Text::new("Header value (empty removes the header):").prompt()?;
        profile
            .headers
            .push(HeaderOverride::new(header_name.trim(), value));
    }

    let restrict = Confirm::new("Restrict this profile to specific URLs?")
        .with_default(false)
        .prompt()?;
    if restrict {
        loop {
            let pattern = Text::new("URL filter (empty to finish):").prompt()?;
            if pattern.trim().is_empty() {
                break;
            }
            profile.url_filters.push(UrlFilter::new(pattern.trim()));
        }
    }

    Ok(profile)
}

/// Asks before deleting a profile
pub fn confirm_remove(profile: &RequestProfile) -> Result<bool> {
    let prompt = format!("Delete profile '{}'?", profile.name);
    Ok(Confirm::new(&prompt).with_default(false).prompt()?)
}
