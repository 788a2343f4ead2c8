use inpaint_common::DeploymentProfile;

use crate::deploy::DeployOutcome;

pub fn print_outcome(outcome: &DeployOutcome, profile: &DeploymentProfile) {
    println!("\n=== Deployment Summary ===");
    println!("  Image:          {}", outcome.image_uri);
    println!(
        "  Replaced model: {}",
        outcome.deleted_model.as_deref().unwrap_or("(none)")
    );
    println!("  Model:          {}", outcome.model);
    println!(
        "  Endpoint:       {} ({})",
        outcome.endpoint,
        if outcome.endpoint_created { "created" } else { "reused" }
    );
    println!("  Deployed ID:    {}", outcome.deployed_model_id);
    println!(
        "  Resources:      {} + {}x {}",
        profile.machine_type, profile.accelerator_count, profile.accelerator_type
    );
    println!(
        "  Replicas:       {}..={}",
        profile.min_replica_count, profile.max_replica_count
    );
    println!("  Traffic:        {}%", profile.traffic_percent);
    println!();
}
