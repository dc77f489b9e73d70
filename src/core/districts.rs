use crate::models::{District, Zone};
use std::collections::{HashMap, HashSet};

/// Reference data: (id, name, alternate name, zone, authored neighbours).
///
/// Neighbours are authored in one direction only for most pairs, so the
/// table is not symmetric. Lookups through [`DistrictGraph`] are.
const PARIS_DISTRICTS: &[(&str, &str, Option<&str>, Zone, &[&str])] = &[
    ("75001", "Paris 1er", Some("Louvre"), Zone::Central, &["75002", "75004", "75006", "75007", "75008"]),
    ("75002", "Paris 2e", Some("Bourse"), Zone::Central, &["75003", "75009", "75010"]),
    ("75003", "Paris 3e", Some("Temple"), Zone::Central, &["75004", "75010", "75011"]),
    ("75004", "Paris 4e", Some("Hôtel-de-Ville"), Zone::Central, &["75005", "75011", "75012"]),
    ("75005", "Paris 5e", Some("Panthéon"), Zone::LeftBank, &["75006", "75013"]),
    ("75006", "Paris 6e", Some("Luxembourg"), Zone::LeftBank, &["75007", "75014", "75015"]),
    ("75007", "Paris 7e", Some("Palais-Bourbon"), Zone::LeftBank, &["75008", "75015", "75016"]),
    ("75008", "Paris 8e", Some("Élysée"), Zone::RightBank, &["75009", "75016", "75017"]),
    ("75009", "Paris 9e", Some("Opéra"), Zone::RightBank, &["75010", "75017", "75018"]),
    ("75010", "Paris 10e", Some("Entrepôt"), Zone::RightBank, &["75011", "75018", "75019"]),
    ("75011", "Paris 11e", Some("Popincourt"), Zone::RightBank, &["75012", "75020"]),
    ("75012", "Paris 12e", Some("Reuilly"), Zone::RightBank, &["75013", "75020", "94"]),
    ("75013", "Paris 13e", Some("Gobelins"), Zone::LeftBank, &["75014", "94"]),
    ("75014", "Paris 14e", Some("Observatoire"), Zone::LeftBank, &["75015", "92"]),
    ("75015", "Paris 15e", Some("Vaugirard"), Zone::LeftBank, &["75016", "92"]),
    ("75016", "Paris 16e", Some("Passy"), Zone::RightBank, &["75017", "92"]),
    ("75017", "Paris 17e", Some("Batignolles-Monceau"), Zone::RightBank, &["75018", "92", "93"]),
    ("75018", "Paris 18e", Some("Butte-Montmartre"), Zone::RightBank, &["75019", "93"]),
    ("75019", "Paris 19e", Some("Buttes-Chaumont"), Zone::RightBank, &["75020", "93"]),
    ("75020", "Paris 20e", Some("Ménilmontant"), Zone::RightBank, &["93"]),
    ("92", "Hauts-de-Seine", None, Zone::OuterRing, &["93"]),
    ("93", "Seine-Saint-Denis", None, Zone::OuterRing, &["94"]),
    ("94", "Val-de-Marne", None, Zone::OuterRing, &["75020", "92"]),
];

/// Static district reference data with an adjacency relation
///
/// Adjacency is treated as symmetric: `a` and `b` are adjacent when either
/// lists the other. Unknown ids are never adjacent and have no zone.
#[derive(Debug, Clone)]
pub struct DistrictGraph {
    districts: HashMap<String, District>,
    edges: HashSet<(String, String)>,
}

impl DistrictGraph {
    /// Build a graph from authored districts
    pub fn new(districts: Vec<District>) -> Self {
        let mut edges = HashSet::new();
        for district in &districts {
            for other in &district.adjacent {
                if other != &district.id {
                    edges.insert(edge_key(&district.id, other));
                }
            }
        }

        let districts = districts
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        Self { districts, edges }
    }

    /// The bundled Paris arrondissements plus the inner suburbs
    pub fn paris() -> Self {
        let districts = PARIS_DISTRICTS
            .iter()
            .map(|(id, name, alt_name, zone, adjacent)| District {
                id: id.to_string(),
                name: name.to_string(),
                alt_name: alt_name.map(str::to_string),
                zone: *zone,
                adjacent: adjacent.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        Self::new(districts)
    }

    pub fn adjacent(&self, a: &str, b: &str) -> bool {
        a != b && self.edges.contains(&edge_key(a, b))
    }

    pub fn same_zone(&self, a: &str, b: &str) -> bool {
        match (self.zone_of(a), self.zone_of(b)) {
            (Some(za), Some(zb)) => za == zb,
            _ => false,
        }
    }

    pub fn zone_of(&self, id: &str) -> Option<Zone> {
        self.districts.get(id).map(|d| d.zone)
    }

    pub fn district(&self, id: &str) -> Option<&District> {
        self.districts.get(id)
    }

    /// All districts, ordered by id
    pub fn districts(&self) -> Vec<&District> {
        let mut all: Vec<&District> = self.districts.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

impl Default for DistrictGraph {
    fn default() -> Self {
        Self::paris()
    }
}

#[inline]
fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
