//! Work planning and the special-case aggregator.
//!
//! Ordinary jobs are independent units. Jobs whose URL matches a special-case
//! keyword form one group per keyword, processed as a single unit so the
//! member pages can be merged in page order before consolidation.

use lekcjonarz_crawler::page_number;
use lekcjonarz_extract::consolidate;
use lekcjonarz_shared::{Job, ReadingBlock, SpecialCase};

/// One independent unit of extraction work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// A single page producing a single day.
    Single(Job),
    /// All member pages of a multi-page event, sorted by page number.
    Group { case: SpecialCase, jobs: Vec<Job> },
}

impl WorkUnit {
    /// Jobs covered by this unit, in processing order.
    pub fn jobs(&self) -> &[Job] {
        match self {
            WorkUnit::Single(job) => std::slice::from_ref(job),
            WorkUnit::Group { jobs, .. } => jobs,
        }
    }

    /// Short label for logging and progress output.
    pub fn label(&self) -> &str {
        match self {
            WorkUnit::Single(job) => &job.url,
            WorkUnit::Group { case, .. } => &case.title,
        }
    }
}

/// Split the job list into work units.
///
/// A group takes the position of its first member in the job list; members
/// are ordered by their trailing page number, ties keep job-list order.
pub fn plan_units(jobs: Vec<Job>, cases: &[SpecialCase]) -> Vec<WorkUnit> {
    let mut units: Vec<WorkUnit> = Vec::new();

    for job in jobs {
        let Some(case) = SpecialCase::find(cases, &job.url) else {
            units.push(WorkUnit::Single(job));
            continue;
        };

        let existing = units.iter_mut().find_map(|unit| match unit {
            WorkUnit::Group { case: c, jobs } if c.keyword == case.keyword => Some(jobs),
            _ => None,
        });
        match existing {
            Some(members) => members.push(job),
            None => units.push(WorkUnit::Group {
                case: case.clone(),
                jobs: vec![job],
            }),
        }
    }

    for unit in &mut units {
        if let WorkUnit::Group { jobs, .. } = unit {
            jobs.sort_by_key(|job| page_number(&job.url));
        }
    }
    units
}

/// Concatenate member pages' raw blocks in page order and consolidate once.
pub fn merge_group(pages: Vec<Vec<ReadingBlock>>) -> Vec<ReadingBlock> {
    consolidate(pages.into_iter().flatten().collect())
}
