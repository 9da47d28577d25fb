use std::fmt;

/// Aggregated CAISO trading hub.
///
/// Variant order is the presentation order of the detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hub {
    Sp15,
    Np15,
    Zp26,
}

impl Hub {
    pub const ALL: [Hub; 3] = [Hub::Sp15, Hub::Np15, Hub::Zp26];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hub::Sp15 => "SP15",
            Hub::Np15 => "NP15",
            Hub::Zp26 => "ZP26",
        }
    }

    /// OASIS pricing node that carries this hub's interval LMP.
    pub fn node(&self) -> &'static str {
        match self {
            Hub::Sp15 => "TH_SP15_GEN-APND",
            Hub::Np15 => "TH_NP15_GEN-APND",
            Hub::Zp26 => "TH_ZP26_GEN-APND",
        }
    }

    pub fn from_node(node: &str) -> Option<Hub> {
        Hub::ALL.into_iter().find(|h| h.node() == node.trim())
    }
}

impl fmt::Display for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_resolve_back_to_hubs() {
        for hub in Hub::ALL {
            assert_eq!(Hub::from_node(hub.node()), Some(hub));
        }
        assert_eq!(Hub::from_node("TH_SP16_GEN-APND"), None);
    }

    #[test]
    fn ordering_follows_presentation_order() {
        let mut hubs = vec![Hub::Zp26, Hub::Sp15, Hub::Np15];
        hubs.sort();
        assert_eq!(hubs, vec![Hub::Sp15, Hub::Np15, Hub::Zp26]);
    }
}
