use bulk_source::QueryJob;

use super::format;
use crate::jobs::job_name;

const MAX_NAME_WIDTH: usize = 24;

pub fn run(jobs: &[QueryJob]) {
    let name_width = jobs
        .iter()
        .map(|j| job_name(j).chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH);

    for job in jobs {
        println!(
            "  {:<width$}  {}",
            job_name(job),
            format::query_preview(job.query(), name_width),
            width = name_width
        );
    }

    println!("\n{} jobs", jobs.len());
}
