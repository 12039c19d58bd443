//! Competition data model.
//!
//! The normalized competition tree consumed by the scheduler:
//! `CompetitionData → Event → Competition → SkatingClass → WarmupGroup → Skater`.
//!
//! Parsing and schema validation of federation exports happen upstream;
//! this module only owns the typed shape, the program-segment tag, and the
//! two pre-scheduling transforms (segment split, exclusion filter).
//!
//! # Program Segment
//! Each class carries a [`ProgramSegment`] computed once when the class is
//! built or deserialized. Every consumer reads the tag instead of matching
//! on free-text names again.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Competitive segment of a class or program entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgramSegment {
    /// Short program ("Kortprogram").
    Short,
    /// Free skating ("Friåkning").
    Free,
    /// Neither marker found (e.g. single-segment colour classes).
    #[default]
    Unspecified,
}

impl ProgramSegment {
    /// Classifies a segment from free text (class name and/or program type).
    ///
    /// Short markers win over free markers: "short", "kort".
    /// Free markers: "free", "fri", "lång".
    pub fn classify(name: &str, program_type: &str) -> Self {
        let text = format!("{} {}", name, program_type).to_lowercase();
        if text.contains("short") || text.contains("kort") {
            ProgramSegment::Short
        } else if text.contains("free") || text.contains("fri") || text.contains("lång") {
            ProgramSegment::Free
        } else {
            ProgramSegment::Unspecified
        }
    }

    /// Default ordering priority: short before free before everything else.
    pub fn priority(self) -> u8 {
        match self {
            ProgramSegment::Short => 1,
            ProgramSegment::Free => 2,
            ProgramSegment::Unspecified => 3,
        }
    }

    /// Whether short-program timings apply.
    #[inline]
    pub fn is_short(self) -> bool {
        self == ProgramSegment::Short
    }

    /// Federation label used when splitting mixed classes.
    pub fn label(self) -> &'static str {
        match self {
            ProgramSegment::Short => "Kortprogram",
            ProgramSegment::Free => "Friåkning",
            ProgramSegment::Unspecified => "",
        }
    }
}

/// A club or federation organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Organization identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One program a skater is entered for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEntry {
    /// Federation program type, e.g. "Kortprogram" or "Friåkning".
    #[serde(rename = "type")]
    pub program_type: String,
    /// Discipline (single, pair, ...).
    #[serde(default)]
    pub discipline: String,
}

impl ProgramEntry {
    /// Creates a program entry of the given federation type.
    pub fn new(program_type: impl Into<String>) -> Self {
        Self {
            program_type: program_type.into(),
            discipline: String::new(),
        }
    }

    /// Segment of this entry.
    pub fn segment(&self) -> ProgramSegment {
        ProgramSegment::classify("", &self.program_type)
    }
}

/// A skater (person) entered in the competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skater {
    /// Unique skater identifier.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Birth date (drives age-based soft rules).
    pub birth_date: NaiveDate,
    /// Club the skater represents.
    #[serde(default)]
    pub organization: Organization,
    /// Program entries.
    #[serde(default)]
    pub programs: Vec<ProgramEntry>,
}

impl Skater {
    /// Creates a skater.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date,
            organization: Organization::default(),
            programs: Vec::new(),
        }
    }

    /// Sets the club.
    pub fn with_organization(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.organization = Organization {
            id: id.into(),
            name: name.into(),
        };
        self
    }

    /// Adds a program entry.
    pub fn with_program(mut self, program_type: impl Into<String>) -> Self {
        self.programs.push(ProgramEntry::new(program_type));
        self
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in completed years on `date`.
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        let mut age = date.year() - self.birth_date.year();
        if (date.month(), date.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age
    }

    /// Whether the skater is entered for the given segment.
    pub fn has_segment(&self, segment: ProgramSegment) -> bool {
        self.programs.iter().any(|p| p.segment() == segment)
    }
}

/// A warmup group as delivered by the import layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupGroup {
    /// Group index within the class (1-based in federation exports).
    pub index: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Skaters in start order.
    pub skaters: Vec<Skater>,
}

impl WarmupGroup {
    /// Creates a group.
    pub fn new(index: u32, skaters: Vec<Skater>) -> Self {
        Self {
            index,
            name: format!("Group {index}"),
            skaters,
        }
    }
}

/// A competitive class (one segment of one category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SkatingClassRecord")]
pub struct SkatingClass {
    /// Unique class identifier.
    pub id: String,
    /// Display name, e.g. "Seniorer Damer - Kortprogram".
    pub name: String,
    /// Discipline.
    pub discipline: String,
    /// Federation program type text.
    #[serde(rename = "type")]
    pub program_type: String,
    /// Segment tag, derived once from name and type.
    pub segment: ProgramSegment,
    /// Warmup groups in start order.
    pub groups: Vec<WarmupGroup>,
}

/// Wire shape of a class; the segment is derived on conversion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkatingClassRecord {
    id: String,
    name: String,
    #[serde(default)]
    discipline: String,
    #[serde(rename = "type", default)]
    program_type: String,
    #[serde(default)]
    groups: Vec<WarmupGroup>,
}

impl From<SkatingClassRecord> for SkatingClass {
    fn from(record: SkatingClassRecord) -> Self {
        SkatingClass::new(record.id, record.name, record.program_type)
            .with_discipline(record.discipline)
            .with_groups(record.groups)
    }
}

impl SkatingClass {
    /// Creates an empty class; the segment is classified from name and type.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        program_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let program_type = program_type.into();
        let segment = ProgramSegment::classify(&name, &program_type);
        Self {
            id: id.into(),
            name,
            discipline: String::new(),
            program_type,
            segment,
            groups: Vec::new(),
        }
    }

    /// Sets the discipline.
    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    /// Replaces all groups.
    pub fn with_groups(mut self, groups: Vec<WarmupGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Appends a group.
    pub fn with_group(mut self, group: WarmupGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Puts all skaters into a single imported group.
    pub fn with_skaters(self, skaters: Vec<Skater>) -> Self {
        self.with_group(WarmupGroup::new(1, skaters))
    }

    /// All skaters across groups, in start order.
    pub fn skaters(&self) -> impl Iterator<Item = &Skater> {
        self.groups.iter().flat_map(|g| g.skaters.iter())
    }

    /// Total number of skaters.
    pub fn skater_count(&self) -> usize {
        self.groups.iter().map(|g| g.skaters.len()).sum()
    }

    /// Whether the class has a skater with the given id.
    pub fn contains_skater(&self, skater_id: &str) -> bool {
        self.skaters().any(|s| s.id == skater_id)
    }

    /// Splits a class whose skaters are entered for both segments.
    ///
    /// Returns `[short, free]` classes (ids suffixed `-short`/`-free`, names
    /// suffixed with the federation label), each keeping only the skaters
    /// entered for that segment and dropping empty groups. A class with a
    /// single segment is returned unchanged.
    pub fn split_by_segment(&self) -> Vec<SkatingClass> {
        let has_short = self.skaters().any(|s| s.has_segment(ProgramSegment::Short));
        let has_free = self.skaters().any(|s| s.has_segment(ProgramSegment::Free));
        if !(has_short && has_free) {
            return vec![self.clone()];
        }

        [(ProgramSegment::Short, "short"), (ProgramSegment::Free, "free")]
            .into_iter()
            .filter_map(|(segment, suffix)| {
                let groups: Vec<WarmupGroup> = self
                    .groups
                    .iter()
                    .map(|g| WarmupGroup {
                        index: g.index,
                        name: g.name.clone(),
                        skaters: g
                            .skaters
                            .iter()
                            .filter(|s| s.has_segment(segment))
                            .cloned()
                            .collect(),
                    })
                    .filter(|g| !g.skaters.is_empty())
                    .collect();
                if groups.is_empty() {
                    return None;
                }
                Some(
                    SkatingClass::new(
                        format!("{}-{}", self.id, suffix),
                        format!("{} - {}", self.name, segment.label()),
                        segment.label(),
                    )
                    .with_discipline(self.discipline.clone())
                    .with_groups(groups),
                )
            })
            .collect()
    }
}

/// A competition (category) holding one or more classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    /// Competition identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Classes in import order.
    pub classes: Vec<SkatingClass>,
}

impl Competition {
    /// Creates an empty competition.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            classes: Vec::new(),
        }
    }

    /// Appends a class.
    pub fn with_class(mut self, class: SkatingClass) -> Self {
        self.classes.push(class);
        self
    }
}

/// The event being scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Competitions in import order.
    pub competitions: Vec<Competition>,
}

/// Root of the normalized competition data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionData {
    /// The event.
    pub event: Event,
}

/// Classes and skaters removed from scheduling by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exclusions {
    /// Class ids to drop entirely.
    pub excluded_class_ids: HashSet<String>,
    /// Skater ids withdrawn from every class.
    pub scratched_skater_ids: HashSet<String>,
}

impl Exclusions {
    /// Creates an empty exclusion set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes a class.
    pub fn with_excluded_class(mut self, class_id: impl Into<String>) -> Self {
        self.excluded_class_ids.insert(class_id.into());
        self
    }

    /// Scratches a skater.
    pub fn with_scratched_skater(mut self, skater_id: impl Into<String>) -> Self {
        self.scratched_skater_ids.insert(skater_id.into());
        self
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.excluded_class_ids.is_empty() && self.scratched_skater_ids.is_empty()
    }
}

impl CompetitionData {
    /// Creates data for a single event.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            event: Event {
                id: id.into(),
                name: name.into(),
                competitions: Vec::new(),
            },
        }
    }

    /// Appends a competition.
    pub fn with_competition(mut self, competition: Competition) -> Self {
        self.event.competitions.push(competition);
        self
    }

    /// Parses normalized competition data from JSON.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// All classes in natural (import) order.
    pub fn classes(&self) -> impl Iterator<Item = &SkatingClass> {
        self.event
            .competitions
            .iter()
            .flat_map(|c| c.classes.iter())
    }

    /// Finds a class by id.
    pub fn class(&self, class_id: &str) -> Option<&SkatingClass> {
        self.classes().find(|c| c.id == class_id)
    }

    /// Finds a skater by id (first occurrence).
    pub fn skater(&self, skater_id: &str) -> Option<&Skater> {
        self.classes()
            .flat_map(|c| c.skaters())
            .find(|s| s.id == skater_id)
    }

    /// Splits every mixed-segment class into short and free classes.
    pub fn split_mixed_segments(&self) -> Self {
        let mut data = self.clone();
        for competition in &mut data.event.competitions {
            competition.classes = competition
                .classes
                .iter()
                .flat_map(|c| c.split_by_segment())
                .collect();
        }
        data
    }

    /// Applies exclusions; groups and classes left empty are dropped.
    pub fn filtered(&self, exclusions: &Exclusions) -> Self {
        let mut data = self.clone();
        for competition in &mut data.event.competitions {
            competition
                .classes
                .retain(|c| !exclusions.excluded_class_ids.contains(&c.id));
            for class in &mut competition.classes {
                for group in &mut class.groups {
                    group
                        .skaters
                        .retain(|s| !exclusions.scratched_skater_ids.contains(&s.id));
                }
                class.groups.retain(|g| !g.skaters.is_empty());
            }
            competition.classes.retain(|c| !c.groups.is_empty());
        }
        data
    }
}
