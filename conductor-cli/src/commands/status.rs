use super::flag;
use anyhow::Result;
use conductor_cluster::commands::{self, MembershipView, RoleHolder, SequencerRow};
use conductor_cluster::OpsContext;

fn holder(role: &RoleHolder) -> String {
    match role {
        RoleHolder::Nobody => "none".to_string(),
        RoleHolder::One(id) => id.clone(),
        RoleHolder::Many(ids) => format!("AMBIGUOUS ({})", ids.join(", ")),
    }
}

fn unsafe_number(row: &SequencerRow) -> String {
    row.status
        .unsafe_l2
        .as_ref()
        .map_or_else(|| "?".to_string(), |h| h.number.to_string())
}

fn unsafe_hash(row: &SequencerRow) -> &str {
    row.status
        .unsafe_l2
        .as_ref()
        .map_or("?", |h| h.hash.as_str())
}

/// Show every sequencer in a network and its cluster membership drift
pub async fn run_status(ctx: &mut OpsContext, network: &str) -> Result<()> {
    let report = commands::status(ctx, network).await?;

    let with_builder = report.rows.iter().any(|r| r.extensions.builder.is_some());
    let with_rollup_boost = report
        .rows
        .iter()
        .any(|r| r.extensions.rollup_boost.is_some());

    println!("Network: {}", report.network);
    println!("{}", "=".repeat(9 + report.network.len()));
    println!("Healthy:        {}", flag(Some(report.healthy)));
    println!("All reachable:  {}", flag(Some(report.update_successful)));
    println!("Leader:         {}", holder(&report.leader));
    println!("Active:         {}", holder(&report.active));
    println!();

    let mut header = format!(
        "{:<20} {:<7} {:<10} {:<7} {:<8} {:<7} {:<12}",
        "SEQUENCER", "VOTING", "CONDUCTOR", "LEADER", "HEALTHY", "ACTIVE", "UNSAFE"
    );
    if with_builder {
        header.push_str(&format!(" {:<12}", "BUILDER"));
    }
    if with_rollup_boost {
        header.push_str(&format!(" {:<12}", "EXEC_MODE"));
    }
    header.push_str(" UNSAFE_HASH");
    println!("{}", header);
    println!("{}", "-".repeat(header.len() + 56));

    for row in &report.rows {
        let mut line = format!(
            "{:<20} {:<7} {:<10} {:<7} {:<8} {:<7} {:<12}",
            row.sequencer_id,
            flag(Some(row.voting)),
            flag(row.status.conductor_active),
            flag(row.status.conductor_leader),
            flag(row.status.sequencer_healthy),
            flag(row.status.sequencer_active),
            unsafe_number(row),
        );
        if with_builder {
            let builder = row
                .extensions
                .builder
                .as_ref()
                .map_or_else(
                    || "-".to_string(),
                    |b| {
                        b.unsafe_l2
                            .as_ref()
                            .map_or_else(|| "?".to_string(), |h| h.number.to_string())
                    },
                );
            line.push_str(&format!(" {:<12}", builder));
        }
        if with_rollup_boost {
            let mode = row
                .extensions
                .rollup_boost
                .as_ref()
                .map_or("-", |r| r.execution_mode.as_deref().unwrap_or("?"));
            line.push_str(&format!(" {:<12}", mode));
        }
        line.push(' ');
        line.push_str(unsafe_hash(row));
        if !row.update_successful {
            line.push_str("  (incomplete)");
        }
        println!("{}", line);
    }
    println!();

    match &report.membership {
        MembershipView::Checked(issues) if issues.is_empty() => {
            println!("Cluster membership matches configuration");
        }
        MembershipView::Checked(issues) => {
            println!("Cluster membership issues:");
            for issue in issues {
                println!("  - {}", issue);
            }
            println!("Run update-cluster-membership to reconcile");
        }
        MembershipView::Unavailable(reason) => {
            println!("Cluster membership unavailable: {}", reason);
        }
        MembershipView::NoLeader => {
            println!("Cluster membership not checked: no unique leader");
        }
    }

    Ok(())
}
