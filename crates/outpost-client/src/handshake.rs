//! The identity payload sent when a connection comes up.
//!
//! Layout of the `connect` call arguments:
//!
//! ```text
//! version:i32 | version_type:str | name:str | locale:str | usid:str
//! uuid:str | mobile:bool | color:u32 | mods:str_list
//! ```

use bytes::Bytes;

use outpost_config::{HostGroup, HostPolicy};
use outpost_net::{WireWriter, endpoint_of, host_of};

use crate::collab::IdentitySource;

/// Errors that abort a handshake before anything is sent.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("no device identifier available")]
    MissingDeviceId,
}

/// Identity sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub name: String,
    pub locale: String,
    pub mods: Vec<String>,
    pub mobile: bool,
    pub version_type: String,
    pub version: i32,
    /// RGBA8888.
    pub color: u32,
    /// Per-endpoint session token.
    pub usid: String,
    /// Stable device identifier.
    pub uuid: String,
}

impl Handshake {
    pub fn encode(&self) -> Bytes {
        let mut out = WireWriter::with_capacity(128);
        out.write_i32(self.version)
            .write_str(&self.version_type)
            .write_str(&self.name)
            .write_str(&self.locale)
            .write_str(&self.usid)
            .write_str(&self.uuid)
            .write_bool(self.mobile)
            .write_u32(self.color)
            .write_str_list(&self.mods);
        out.finish()
    }
}

/// Assemble the handshake for a connection to `address` (`host/ip:port`).
///
/// The session token is keyed by `ip:port`. Name and color pass through the
/// policy of the first host group listing the bare ip.
pub fn build_handshake(
    identity: &mut dyn IdentitySource,
    address: &str,
    hosts: &[HostGroup],
) -> Result<Handshake, HandshakeError> {
    let profile = identity.profile();
    let uuid = identity.device_id().ok_or(HandshakeError::MissingDeviceId)?;
    let usid = identity.session_token(endpoint_of(address));

    let host = host_of(address);
    let (name, color) = match hosts.iter().find(|g| g.contains(host)) {
        Some(group) => {
            tracing::debug!("Applying host policy '{}' for {host}", group.name);
            apply_host_policy(&profile.name, profile.color, &group.policy)
        }
        None => (profile.name, profile.color),
    };

    let locale = if profile.locale == "default" {
        "en".to_string()
    } else {
        profile.locale
    };

    Ok(Handshake {
        name,
        locale,
        mods: profile.mods,
        mobile: profile.mobile,
        version_type: profile.version_type,
        version: profile.version,
        color,
        usid,
        uuid,
    })
}

/// Rewrite a display name and color for a host policy.
pub fn apply_host_policy(name: &str, color: u32, policy: &HostPolicy) -> (String, u32) {
    match policy {
        HostPolicy::None => (name.to_string(), color),
        HostPolicy::StripColorTag => {
            let Some((tag, rest)) = name
                .strip_prefix('[')
                .and_then(|inner| inner.split_once(']'))
            else {
                return (name.to_string(), color);
            };
            let color = named_color(tag)
                .or_else(|| parse_hex_color(tag))
                .unwrap_or(color);
            (rest.to_string(), color)
        }
        HostPolicy::RestrictColor { palette, fallback } => {
            if palette.contains(&color) {
                (name.to_string(), color)
            } else {
                (name.to_string(), *fallback)
            }
        }
    }
}

/// RGBA value of a markup color name.
pub fn named_color(name: &str) -> Option<u32> {
    let rgba = match name.to_ascii_lowercase().as_str() {
        "clear" => 0x0000_0000,
        "black" => 0x0000_00ff,
        "white" => 0xffff_ffff,
        "lightgray" | "lightgrey" => 0xbfbf_bfff,
        "gray" | "grey" => 0x7f7f_7fff,
        "darkgray" | "darkgrey" => 0x3f3f_3fff,
        "blue" => 0x0000_ffff,
        "navy" => 0x0000_7fff,
        "royal" => 0x4169_e1ff,
        "slate" => 0x7080_90ff,
        "sky" => 0x87ce_ebff,
        "cyan" => 0x00ff_ffff,
        "teal" => 0x007f_7fff,
        "green" => 0x00ff_00ff,
        "acid" => 0x7fff_00ff,
        "lime" => 0x32cd_32ff,
        "forest" => 0x228b_22ff,
        "olive" => 0x6b8e_23ff,
        "yellow" => 0xffff_00ff,
        "gold" => 0xffd7_00ff,
        "goldenrod" => 0xdaa5_20ff,
        "orange" => 0xffa5_00ff,
        "brown" => 0x8b45_13ff,
        "tan" => 0xd2b4_8cff,
        "brick" => 0xb222_22ff,
        "red" => 0xff00_00ff,
        "scarlet" => 0xff34_1cff,
        "crimson" => 0xdc14_3cff,
        "coral" => 0xff7f_50ff,
        "salmon" => 0xfa80_72ff,
        "pink" => 0xff69_b4ff,
        "magenta" => 0xff00_ffff,
        "purple" => 0xa020_f0ff,
        "violet" => 0xee82_eeff,
        "maroon" => 0xb030_60ff,
        _ => return None,
    };
    Some(rgba)
}

/// Parse `rrggbb` or `rrggbbaa`, with or without a leading `#`.
pub fn parse_hex_color(text: &str) -> Option<u32> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok().map(|rgb| (rgb << 8) | 0xff),
        8 => u32::from_str_radix(hex, 16).ok(),
        _ => None,
    }
}
