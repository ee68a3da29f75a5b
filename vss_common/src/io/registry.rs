//! Relay registry: the apparatus wiring resolved from [`VssConfig`].
//!
//! Built once at startup. Immutable after construction. Every entity is
//! processed independently: a broken relay section does not stop the switch,
//! indicator or reset-button sections from being checked, so the operator
//! gets one combined report.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::channel_map::{Channel, ChannelMapError, HardwareRevision};
use super::relay::{RelayConfig, RelaySlot};
use super::report::{ErrorReport, IssueKind};
use crate::config::{PinSection, RelaySection, VssConfig};

/// Entity name used for `[general]` problems.
const GENERAL: &str = "general";

/// Resolved apparatus wiring.
#[derive(Debug, Clone)]
pub struct RelayRegistry {
    experiment: String,
    revision: Option<HardwareRevision>,
    /// Active relays only.
    relays: BTreeMap<RelaySlot, RelayConfig>,
    inactive: Vec<RelaySlot>,
    /// Reverse index for trip dispatch.
    by_channel: HashMap<Channel, RelaySlot>,
    switches: Vec<(String, Channel)>,
    indicator: Option<Channel>,
    reset_button: Option<Channel>,
}

impl RelayRegistry {
    /// Resolve every configured entity.
    ///
    /// Returns whatever could be built together with every problem found.
    /// A non-empty report means the registry must not be used to arm.
    pub fn load(config: &VssConfig) -> (Self, ErrorReport) {
        let mut report = ErrorReport::new();

        let revision = match config.general.revision.as_deref() {
            None => {
                report.push(GENERAL, IssueKind::MissingField, "missing 'revision'");
                None
            }
            Some(tag) => match tag.parse::<HardwareRevision>() {
                Ok(rev) => Some(rev),
                Err(e) => {
                    report.push(GENERAL, IssueKind::UnknownRevision, e.to_string());
                    None
                }
            },
        };

        let mut registry = Self {
            experiment: config.general.experiment_name.clone(),
            revision,
            relays: BTreeMap::new(),
            inactive: Vec::new(),
            by_channel: HashMap::new(),
            switches: Vec::new(),
            indicator: None,
            reset_button: None,
        };

        for key in config.relay.keys() {
            if key.parse::<RelaySlot>().is_err() {
                report.push(
                    format!("relay.{key}"),
                    IssueKind::UnknownSection,
                    format!("no relay slot named {key:?}, expected A-F"),
                );
            }
        }

        for slot in RelaySlot::ALL {
            let entity = format!("relay.{slot}");
            match config.relay.get(slot.key()) {
                None => report.push(
                    &entity,
                    IssueKind::MissingSection,
                    format!("section [{entity}] is missing"),
                ),
                Some(section) => {
                    if let Some(relay) = registry.load_relay(slot, &entity, section, &mut report) {
                        registry.relays.insert(slot, relay);
                    }
                }
            }
        }

        match &config.shutdown {
            None => report.push(
                "shutdown",
                IssueKind::MissingSection,
                "section [shutdown] is missing",
            ),
            Some(table) if table.is_empty() => {
                warn!("No shutdown switches configured; trips will only raise alerts");
            }
            Some(table) => {
                for (name, value) in table {
                    let entity = format!("shutdown.{name}");
                    let pin = read_field(&entity, "pin", Some(value), INTEGER, &mut report);
                    if let Some(ch) =
                        pin.and_then(|pin| registry.resolve(&entity, pin, &mut report))
                    {
                        registry.switches.push((name.clone(), ch));
                    }
                }
            }
        }

        registry.indicator = registry.load_pin("error_led", config.error_led.as_ref(), &mut report);
        registry.reset_button =
            registry.load_pin("reset_button", config.reset_button.as_ref(), &mut report);

        registry.check_unique(&mut report);

        (registry, report)
    }

    fn load_relay(
        &mut self,
        slot: RelaySlot,
        entity: &str,
        section: &RelaySection,
        report: &mut ErrorReport,
    ) -> Option<RelayConfig> {
        let active = read_field(entity, "active", section.active.as_ref(), BOOLEAN, report)?;
        if !active {
            debug!(relay = %slot, "Relay inactive, not wired");
            self.inactive.push(slot);
            return None;
        }

        let pin = read_field(entity, "pin", section.pin.as_ref(), INTEGER, report);
        let name = read_field(entity, "name", section.name.as_ref(), STRING, report);
        let warning = read_field(entity, "warning", section.warning.as_ref(), BOOLEAN, report);
        let shutdown = read_field(entity, "shutdown", section.shutdown.as_ref(), BOOLEAN, report);

        let channel = self.resolve(entity, pin?, report)?;
        Some(RelayConfig {
            slot,
            name: name?,
            channel,
            warn_on_trip: warning?,
            shutdown_on_trip: shutdown?,
            active,
        })
    }

    fn load_pin(
        &self,
        entity: &str,
        section: Option<&PinSection>,
        report: &mut ErrorReport,
    ) -> Option<Channel> {
        let Some(section) = section else {
            report.push(
                entity,
                IssueKind::MissingSection,
                format!("section [{entity}] is missing"),
            );
            return None;
        };
        let pin = read_field(entity, "pin", section.pin.as_ref(), INTEGER, report)?;
        self.resolve(entity, pin, report)
    }

    /// Resolve a pin. Silent when the revision is already known to be bad.
    fn resolve(&self, entity: &str, pin: i64, report: &mut ErrorReport) -> Option<Channel> {
        let revision = self.revision?;
        match revision.resolve(pin) {
            Ok(ch) => Some(ch),
            Err(e @ ChannelMapError::UnmappedPin { .. }) => {
                report.push(entity, IssueKind::UnmappedPin, e.to_string());
                None
            }
            Err(e) => {
                report.push(entity, IssueKind::UnknownRevision, e.to_string());
                None
            }
        }
    }

    /// Every channel may be claimed by exactly one entity. Builds the reverse
    /// relay index as a side effect.
    fn check_unique(&mut self, report: &mut ErrorReport) {
        let mut owners: HashMap<Channel, String> = HashMap::new();

        let mut claims: Vec<(String, Channel)> = Vec::new();
        for relay in self.relays.values() {
            claims.push((format!("relay.{}", relay.slot), relay.channel));
        }
        for (name, ch) in &self.switches {
            claims.push((format!("shutdown.{name}"), *ch));
        }
        if let Some(ch) = self.indicator {
            claims.push(("error_led".to_string(), ch));
        }
        if let Some(ch) = self.reset_button {
            claims.push(("reset_button".to_string(), ch));
        }

        for (entity, ch) in claims {
            if let Some(owner) = owners.get(&ch) {
                report.push(
                    &entity,
                    IssueKind::DuplicateChannel,
                    format!("channel {ch} already assigned to {owner}"),
                );
                continue;
            }
            owners.insert(ch, entity);
        }

        for relay in self.relays.values() {
            self.by_channel.entry(relay.channel).or_insert(relay.slot);
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Experiment name used in alert texts.
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn revision(&self) -> Option<HardwareRevision> {
        self.revision
    }

    /// Reverse lookup of the relay owning `channel`. O(1).
    pub fn relay_for(&self, channel: Channel) -> Option<&RelayConfig> {
        self.by_channel
            .get(&channel)
            .and_then(|slot| self.relays.get(slot))
    }

    /// Active relay in `slot`.
    pub fn relay(&self, slot: RelaySlot) -> Option<&RelayConfig> {
        self.relays.get(&slot)
    }

    /// Channel of the active relay in `slot`.
    pub fn channel_of(&self, slot: RelaySlot) -> Option<Channel> {
        self.relays.get(&slot).map(|r| r.channel)
    }

    /// Active relays in slot order.
    pub fn active_relays(&self) -> impl Iterator<Item = &RelayConfig> {
        self.relays.values()
    }

    /// Slots configured with `active = false`.
    pub fn inactive_slots(&self) -> &[RelaySlot] {
        &self.inactive
    }

    /// Shutdown switches as `(name, channel)` in name order.
    pub fn switches(&self) -> &[(String, Channel)] {
        &self.switches
    }

    pub fn indicator(&self) -> Option<Channel> {
        self.indicator
    }

    pub fn reset_button(&self) -> Option<Channel> {
        self.reset_button
    }
}

// ─── Field typing ───────────────────────────────────────────────────

/// Expected TOML type of an entity field.
struct Expect<T> {
    what: &'static str,
    extract: fn(&toml::Value) -> Option<T>,
}

const INTEGER: Expect<i64> = Expect {
    what: "an integer",
    extract: toml::Value::as_integer,
};

const BOOLEAN: Expect<bool> = Expect {
    what: "a boolean",
    extract: toml::Value::as_bool,
};

const STRING: Expect<String> = Expect {
    what: "a string",
    extract: owned_str,
};

fn owned_str(value: &toml::Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

/// Read one typed field, reporting it as missing or invalid.
fn read_field<T>(
    entity: &str,
    field: &str,
    value: Option<&toml::Value>,
    expect: Expect<T>,
    report: &mut ErrorReport,
) -> Option<T> {
    let Some(value) = value else {
        report.push(entity, IssueKind::MissingField, format!("missing '{field}'"));
        return None;
    };
    let typed = (expect.extract)(value);
    if typed.is_none() {
        report.push(
            entity,
            IssueKind::InvalidField,
            format!("'{field}' must be {}, found {}", expect.what, value.type_str()),
        );
    }
    typed
}
