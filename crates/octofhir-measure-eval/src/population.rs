//! Per-subject population membership and the set algebra applied to it

use indexmap::{IndexMap, IndexSet};
use octofhir_measure_def::PopulationDef;
use octofhir_measure_diagnostics::Result;
use octofhir_measure_types::{MeasurePopulationType, ResourceRef, ResultValue};
use rust_decimal::Decimal;

use crate::aggregate::aggregate;
use crate::evaluation::{SubjectResults, subject_ref};

/// Members of one population, grouped by the subject that produced them
///
/// For a boolean basis every subject contributes a single member, its own
/// reference. For a resource basis the members are the resources the criteria
/// expression returned. Subjects with no members are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectMembers {
    subjects: IndexMap<String, IndexSet<ResultValue>>,
}

impl SubjectMembers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect members of `expression` across all subjects
    pub fn from_results(
        results: &SubjectResults,
        expression: &str,
        boolean_basis: bool,
        subject_type: &str,
    ) -> Self {
        let mut members = Self::new();
        for (subject, value) in results.results_for(expression) {
            for element in value.elements() {
                if boolean_basis {
                    if element.is_true() {
                        members.insert(subject, ResultValue::Resource(subject_ref(subject, subject_type)));
                    }
                } else if let ResultValue::Resource(_) = element {
                    members.insert(subject, element.clone());
                }
            }
        }
        members
    }

    pub fn insert(&mut self, subject: &str, member: ResultValue) {
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .insert(member);
    }

    /// Keep only members also present in `other` (∩=)
    pub fn retain_in(&mut self, other: &SubjectMembers) {
        self.subjects.retain(|subject, members| {
            match other.subjects.get(subject) {
                Some(keep) => members.retain(|m| keep.contains(m)),
                None => members.clear(),
            }
            !members.is_empty()
        });
    }

    /// Remove members present in `other` (−=)
    pub fn remove_in(&mut self, other: &SubjectMembers) {
        self.subjects.retain(|subject, members| {
            if let Some(drop) = other.subjects.get(subject) {
                members.retain(|m| !drop.contains(m));
            }
            !members.is_empty()
        });
    }

    /// Members kept by a stratum filter
    pub fn restrict(&self, filter: &StratumFilter) -> SubjectMembers {
        let mut restricted = SubjectMembers::new();
        for (subject, members) in &self.subjects {
            let Some(keys) = filter.subjects.get(subject) else {
                continue;
            };
            for member in members {
                if keys.as_ref().is_none_or(|k| k.contains(member)) {
                    restricted.insert(subject, member.clone());
                }
            }
        }
        restricted
    }

    pub fn contains(&self, subject: &str, member: &ResultValue) -> bool {
        self.subjects
            .get(subject)
            .is_some_and(|members| members.contains(member))
    }

    pub fn contains_subject(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn member_count(&self) -> usize {
        self.subjects.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &String> {
        self.subjects.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexSet<ResultValue>)> {
        self.subjects.iter()
    }

    /// Subject references, for result reporting
    pub fn subject_refs(&self, subject_type: &str) -> Vec<ResourceRef> {
        self.subjects
            .keys()
            .map(|s| subject_ref(s, subject_type))
            .collect()
    }

    /// Distinct members across subjects, in first-seen order
    pub fn distinct_members(&self) -> Vec<ResultValue> {
        let mut seen = IndexSet::new();
        for members in self.subjects.values() {
            seen.extend(members.iter().cloned());
        }
        seen.into_iter().collect()
    }
}

/// Which subjects, and optionally which of their members, belong to a stratum
///
/// `None` keeps every member of the subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StratumFilter {
    subjects: IndexMap<String, Option<IndexSet<ResultValue>>>,
}

impl StratumFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every member of `subject`
    pub fn add_subject(&mut self, subject: &str) {
        self.subjects.insert(subject.to_string(), None);
    }

    /// Keep `key` among the members of `subject`
    pub fn add_key(&mut self, subject: &str, key: ResultValue) {
        if let Some(keys) = self
            .subjects
            .entry(subject.to_string())
            .or_insert_with(|| Some(IndexSet::new()))
        {
            keys.insert(key);
        }
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }
}

/// One measure observation: the member it was taken for and its numeric value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub subject: String,
    pub key: ResultValue,
    pub value: Decimal,
}

/// A population definition with the members it holds after correction
#[derive(Debug, Clone)]
pub struct PopulationState<'a> {
    pub def: &'a PopulationDef,
    pub members: SubjectMembers,
    /// Only filled for measure observation populations
    pub observations: Vec<Observation>,
}

impl<'a> PopulationState<'a> {
    pub fn new(def: &'a PopulationDef, members: SubjectMembers) -> Self {
        Self {
            def,
            members,
            observations: Vec::new(),
        }
    }

    pub fn is_observation(&self) -> bool {
        self.def.population_type == MeasurePopulationType::MeasureObservation
    }

    /// Reported count: observations for a measure observation, members otherwise
    pub fn count(&self) -> usize {
        if self.is_observation() {
            self.observations.len()
        } else {
            self.members.member_count()
        }
    }

    /// Count within a stratum
    pub fn count_in(&self, filter: &StratumFilter) -> usize {
        if self.is_observation() {
            self.observations_in(filter).len()
        } else {
            self.members.restrict(filter).member_count()
        }
    }

    /// Aggregate of all observation values, if this population aggregates
    pub fn aggregation(&self) -> Result<Option<Decimal>> {
        let Some(method) = self.def.aggregate_method.filter(|_| self.is_observation()) else {
            return Ok(None);
        };
        let values: Vec<Decimal> = self.observations.iter().map(|o| o.value).collect();
        aggregate(&values, method)
    }

    /// Aggregate of the observation values within a stratum
    pub fn aggregation_in(&self, filter: &StratumFilter) -> Result<Option<Decimal>> {
        let Some(method) = self.def.aggregate_method.filter(|_| self.is_observation()) else {
            return Ok(None);
        };
        let values: Vec<Decimal> = self.observations_in(filter).iter().map(|o| o.value).collect();
        aggregate(&values, method)
    }

    /// Subjects contributing to this population
    pub fn subject_refs(&self, subject_type: &str) -> Vec<ResourceRef> {
        if !self.is_observation() {
            return self.members.subject_refs(subject_type);
        }
        let subjects: IndexSet<&str> = self.observations.iter().map(|o| o.subject.as_str()).collect();
        subjects
            .into_iter()
            .map(|s| subject_ref(s, subject_type))
            .collect()
    }

    /// Observations whose member passes the stratum filter
    pub fn observations_in(&self, filter: &StratumFilter) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| match filter.subjects.get(&o.subject) {
                Some(None) => true,
                Some(Some(keys)) => keys.contains(&o.key),
                None => false,
            })
            .collect()
    }
}
