use std::collections::BTreeMap;

use crate::api::types::AccessPoint;

/// Every access point seen since the table was created, keyed by SSID.
///
/// Entries are replaced wholesale when the same SSID shows up again and are
/// never dropped by polling, so networks that went out of range stay listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownAps {
    entries: BTreeMap<String, AccessPoint>,
}

impl KnownAps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `ap.ssid`.
    pub fn upsert(&mut self, ap: AccessPoint) {
        self.entries.insert(ap.ssid.clone(), ap);
    }

    /// Merge a scan result; returns how many SSIDs were new.
    pub fn upsert_all(&mut self, aps: impl IntoIterator<Item = AccessPoint>) -> usize {
        let mut added = 0;
        for ap in aps {
            if self.entries.insert(ap.ssid.clone(), ap).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, ssid: &str) -> Option<&AccessPoint> {
        self.entries.get(ssid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in render order (ascending SSID).
    pub fn iter(&self) -> impl Iterator<Item = &AccessPoint> {
        self.entries.values()
    }

    pub fn ssids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
