//! Check command: validate settings and report what would be watched.

use anyhow::Result;

use crate::config::Settings;
use crate::watcher::qualifying_repos;

/// Validate `settings` and print the repositories that qualify right now.
pub fn run(settings: &Settings) -> Result<()> {
    let plan = settings.validate()?;
    let repos = qualifying_repos(&plan)?;

    println!("repos root:   {}", plan.repos_root.display());
    println!("watch path:   {}", plan.watch_path.display());
    println!("watch regexp: {}", plan.pattern.as_str());
    println!("execute:      {} -c {:?}", plan.shell, plan.execute);
    println!();

    if repos.is_empty() {
        println!("No repositories contain {}", plan.watch_path.display());
    } else {
        println!("{} repositories:", repos.len());
        for repo in &repos {
            println!("  {}", repo.display());
        }
    }
    Ok(())
}
