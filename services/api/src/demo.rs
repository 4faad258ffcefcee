use crate::infra::{seed_directory, InMemoryTicketStore, LoggingNotifier};
use clap::Args;
use std::sync::Arc;

use fixit::error::AppError;
use fixit::tickets::{
    Actor, AssignmentRequest, BuildingId, CreateTicketRequest, Role, Ticket, TicketCategory,
    TicketPriority, TicketService, TicketStatus, UserId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the full timeline after every mutation instead of only at the end
    #[arg(long)]
    pub(crate) show_timeline: bool,
}

/// Walk one maintenance request from intake to completion, including the
/// denial a second technician runs into, against in-memory adapters.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = TicketService::new(
        Arc::new(InMemoryTicketStore::default()),
        Arc::new(seed_directory()),
        Arc::new(LoggingNotifier),
    );

    let stored = service.create(CreateTicketRequest {
        building_id: BuildingId("maple-court".to_string()),
        created_by: UserId("res-ira".to_string()),
        created_by_name: "Ira Novak".to_string(),
        title: "Radiator hissing in unit 2A".to_string(),
        description: "Constant hissing and low heat since Monday".to_string(),
        category: TicketCategory::Hvac,
        priority: TicketPriority::High,
        location: "Unit 2A".to_string(),
        contact_phone: Some("555-0117".to_string()),
        images: Vec::new(),
    })?;
    let ticket_id = stored.ticket.id.clone();
    println!("resident opened {}: {}", ticket_id.0, stored.ticket.title);
    print_step(&stored.ticket, args.show_timeline);

    let assigned = service.assign(AssignmentRequest {
        ticket_id: ticket_id.clone(),
        technician_id: UserId("tech-ona".to_string()),
        technician_name: "Ona Torres".to_string(),
        assigned_by: UserId("adm-maple".to_string()),
        assigned_by_name: "Dana Admin".to_string(),
    })?;
    println!(
        "admin assigned {} to {}",
        ticket_id.0,
        assigned
            .ticket
            .assigned_to_name
            .as_deref()
            .unwrap_or("(unset)")
    );
    print_step(&assigned.ticket, args.show_timeline);

    let ona = technician("tech-ona", "Ona Torres");
    let lev = technician("tech-lev", "Lev Adler");

    match service.transition(&ticket_id, TicketStatus::Accepted, &lev, None) {
        Err(err) => println!("lev tries to accept and is turned away: {err}"),
        Ok(_) => println!("unexpected: lev accepted a ticket assigned to ona"),
    }

    let accepted = service.transition(&ticket_id, TicketStatus::Accepted, &ona, None)?;
    println!("ona accepted the job");
    print_step(&accepted.ticket, args.show_timeline);

    service.transition(
        &ticket_id,
        TicketStatus::InProgress,
        &ona,
        Some("bleeding the radiator, valve replacement likely".to_string()),
    )?;
    println!("work started");

    let completed = service.transition(&ticket_id, TicketStatus::Completed, &ona, None)?;
    println!("work completed");
    print_timeline(&completed.ticket);

    Ok(())
}

fn technician(id: &str, name: &str) -> Actor {
    Actor {
        id: UserId(id.to_string()),
        name: name.to_string(),
        role: Role::Technician,
        building_id: BuildingId("maple-court".to_string()),
        super_admin: false,
    }
}

fn print_step(ticket: &Ticket, show_timeline: bool) {
    println!("  status: {}", ticket.status.label());
    if show_timeline {
        print_timeline(ticket);
    }
}

fn print_timeline(ticket: &Ticket) {
    println!("  timeline for {}:", ticket.id.0);
    for event in ticket.timeline.entries() {
        let note = event.note.as_deref().unwrap_or("-");
        println!(
            "    {} {} by {} ({})",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.status.label(),
            event.actor_name,
            note
        );
    }
}
