//! Pedigree graph: dogs linked to their mother and father.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ValidationError;
use crate::registry::types::DogRecord;
use crate::types::{DogId, Parent};

/// A set of dog records with `dog → mother` and `dog → father` edges.
///
/// Shared ancestors are allowed; self-references and cycles are not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PedigreeGraph {
    dogs: BTreeMap<DogId, DogRecord>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl PedigreeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: DogRecord) {
        self.dogs.insert(record.id, record);
    }

    pub fn get(&self, id: DogId) -> Option<&DogRecord> {
        self.dogs.get(&id)
    }

    pub fn contains(&self, id: DogId) -> bool {
        self.dogs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.dogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &DogRecord> {
        self.dogs.values()
    }

    /// Check that no dog is its own parent or its own ancestor.
    ///
    /// Edges to dogs outside the graph are treated as leaves.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for record in self.dogs.values() {
            if let Some((parent, id)) = record.parents().find(|(_, id)| *id == record.id) {
                return Err(ValidationError::SelfReference { parent, id });
            }
        }

        let mut marks: HashMap<DogId, Mark> = HashMap::with_capacity(self.dogs.len());
        for &start in self.dogs.keys() {
            if marks.contains_key(&start) {
                continue;
            }
            // Iterative DFS; each frame is a node and its pending parent edges.
            let mut stack: Vec<(DogId, Vec<DogId>)> = vec![(start, self.parent_ids(start))];
            marks.insert(start, Mark::Visiting);

            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                let next = pending.pop();
                match next {
                    Some(next) => match marks.get(&next).copied() {
                        Some(Mark::Visiting) => return Err(ValidationError::Cycle(next)),
                        Some(Mark::Done) => {}
                        None if self.contains(next) => {
                            marks.insert(next, Mark::Visiting);
                            let parents = self.parent_ids(next);
                            stack.push((next, parents));
                        }
                        None => {}
                    },
                    None => {
                        marks.insert(node, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn parent_ids(&self, id: DogId) -> Vec<DogId> {
        self.dogs
            .get(&id)
            .map(|record| record.parents().map(|(_, id)| id).collect())
            .unwrap_or_default()
    }
}

/// Ancestry of one dog, `generations` levels deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedigree {
    pub root: DogId,
    pub generations: u32,
    pub graph: PedigreeGraph,
}

impl Pedigree {
    pub fn subject(&self) -> Option<&DogRecord> {
        self.graph.get(self.root)
    }

    pub fn parent_of(&self, id: DogId, parent: Parent) -> Option<&DogRecord> {
        let record = self.graph.get(id)?;
        let parent_id = match parent {
            Parent::Mother => record.mother_id,
            Parent::Father => record.father_id,
        }?;
        self.graph.get(parent_id)
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: DogId, depth: u32, label: &str) -> fmt::Result {
        let indent = "  ".repeat(depth as usize);
        match self.graph.get(id) {
            Some(dog) => writeln!(
                f,
                "{indent}{label}{} (#{}) {}, {}, age {}",
                dog.name, dog.id, dog.breed, dog.sex, dog.age
            )?,
            None => return writeln!(f, "{indent}{label}#{id} (not loaded)"),
        }
        if depth >= self.generations {
            return Ok(());
        }
        for (parent, parent_id) in self.graph.get(id).into_iter().flat_map(|dog| dog.parents()) {
            let label = match parent {
                Parent::Mother => "dam: ",
                Parent::Father => "sire: ",
            };
            self.write_node(f, parent_id, depth + 1, label)?;
        }
        Ok(())
    }
}

impl fmt::Display for Pedigree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0, "")
    }
}
