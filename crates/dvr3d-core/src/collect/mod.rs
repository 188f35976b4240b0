//! Scrapes the numeric outputs of finished units back into tables.

mod assignments;
mod energies;
mod failure;
mod transitions;

pub use assignments::{
    ASSIGNMENTS_CSV, ASSIGNMENTS_STAT, AssignmentCollection, AssignmentRow, assignment_file,
    collect_assignments, parse_assignment_table,
};
pub use energies::{
    BlockResult, BlockStatistics, ENERGIES_FILE, ResultRecord, STATES_CSV, STATES_STAT,
    STATES_ZPE, StatesCollection, aggregate_states, collect_states, parse_result_table,
    read_zero_point_energy,
};
pub use failure::{FailureDiagnosis, JOB_LOG_PATTERN, detect_failure, diagnose_log, latest_job_log};
pub use transitions::{
    DIPOLE3B_CSV, DipoleRow, SPECTRA_CSV, SpectraRow, TRANSITIONS_STAT, TransitionStatistics,
    TransitionsCollection, collect_transitions, parse_dipole3b_table, parse_spectra_table,
};
