use serde::{Deserialize, Serialize};

/// Coarse, self-reported client environment. Sent by the page when a form session begins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub screen_width: Option<u32>,
    #[serde(default)]
    pub screen_height: Option<u32>,
    /// Minutes behind UTC, as browsers report it.
    #[serde(default)]
    pub timezone_offset: Option<i32>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Low-entropy client signature for correlating repeated abuse.
/// Collisions between unrelated clients are expected.
pub fn fingerprint(profile: &ClientProfile) -> String {
    let components = [
        profile.language.clone().unwrap_or_default(),
        profile.platform.clone().unwrap_or_default(),
        format!(
            "{}x{}",
            profile.screen_width.unwrap_or(0),
            profile.screen_height.unwrap_or(0)
        ),
        profile.timezone_offset.unwrap_or(0).to_string(),
    ];

    let hash = hash32(&components.join("|"));
    to_base36(i64::from(hash).unsigned_abs())
}

/// 31-multiplier string hash over UTF-16 code units, wrapping at 32 bits.
pub fn hash32(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
