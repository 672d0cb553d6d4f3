use std::io::{stderr, Stderr};

pub(crate) type ProgressBar = pbr::ProgressBar<Stderr>;

/// Progress bar on stderr, so that stdout only carries results.
pub(crate) fn create_progress_bar(total: u64) -> ProgressBar {
    let mut pb = ProgressBar::on(stderr(), total);
    pb.show_speed = false;
    pb.show_time_left = false;
    pb.message("Testing ");
    pb
}
