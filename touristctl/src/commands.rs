use anyhow::Context;
use futures::future::join_all;
use tokio::sync::broadcast::error::TryRecvError;
use tourist_core::{
    ResolveOutcome, TouristFacade,
    model::{AlbumEvent, Coordinate, Marker, MarkerId, PhotoSlot, Viewport},
};

use crate::{Command, ViewportCommand, bootstrap::App};

pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let facade = &app.facade;
    match command {
        Command::Place { lat, lon } => {
            let marker = facade.on_marker_placed(lat, lon).await?;
            print_marker(&marker);
        }
        Command::List => {
            for marker in facade.markers().await? {
                print_marker(&marker);
            }
        }
        Command::Find { lat, lon } => match facade.find_marker(lat, lon).await? {
            Some(marker) => print_marker(&marker),
            None => anyhow::bail!("no marker at ({lat}, {lon})"),
        },
        Command::Open { marker_id } => open_album(facade, marker_id).await?,
        Command::Refresh { marker_id } => {
            facade.on_marker_opened(marker_id).await?;
            let slots = facade
                .on_refresh_requested(marker_id)
                .await
                .context("album can only be refreshed once all photos are loaded")?;
            for slot in &slots {
                print_slot(slot);
            }
        }
        Command::Clear { slot_id } => {
            let slot = facade.on_slot_selected(slot_id).await?;
            print_slot(&slot);
        }
        Command::Delete { marker_id } => {
            facade.on_marker_deleted(marker_id).await?;
            println!("deleted {marker_id}");
        }
        Command::Viewport(ViewportCommand::Show) => {
            match facade.load_viewport().await? {
                Some(viewport) => {
                    println!("{}", serde_json::to_string_pretty(&viewport)?)
                }
                None => println!("no viewport stored"),
            }
        }
        Command::Viewport(ViewportCommand::Set {
            lat,
            lon,
            lat_delta,
            lon_delta,
        }) => {
            let viewport =
                Viewport::new(Coordinate::new(lat, lon)?, lat_delta, lon_delta)?;
            facade.save_viewport(&viewport).await?;
            println!("{}", serde_json::to_string_pretty(&viewport)?);
        }
    }
    Ok(())
}

async fn open_album(
    facade: &TouristFacade,
    marker_id: MarkerId,
) -> anyhow::Result<()> {
    let mut events = facade.subscribe();
    let slots = facade.on_marker_opened(marker_id).await?;

    let pending: Vec<&PhotoSlot> =
        slots.iter().filter(|slot| slot.is_pending()).collect();
    for slot in slots.iter().filter(|slot| slot.is_resolved()) {
        print_slot(slot);
    }

    let handles = pending
        .iter()
        .map(|slot| facade.on_slot_needs_image(marker_id, slot.id));
    let results = join_all(handles).await;

    let mut failures = 0;
    for (slot, joined) in pending.iter().zip(results) {
        match joined.context("photo fetch task panicked")? {
            Ok(ResolveOutcome::Resolved(slot)) => print_slot(&slot),
            Ok(ResolveOutcome::Failed(failure)) => {
                failures += 1;
                println!("{:>3}  {}  failed: {failure}", slot.position, slot.id);
            }
            Ok(ResolveOutcome::Discarded) => {
                println!("{:>3}  {}  discarded", slot.position, slot.id)
            }
            Err(err) => {
                failures += 1;
                println!("{:>3}  {}  error: {err}", slot.position, slot.id);
            }
        }
    }

    loop {
        match events.try_recv() {
            Ok(AlbumEvent::AlbumComplete { .. }) => println!("album complete"),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} photo(s) could not be fetched; run open again to retry");
    }
    Ok(())
}

fn print_marker(marker: &Marker) {
    println!(
        "{}  {} {}  {}",
        marker.id,
        marker.latitude,
        marker.longitude,
        marker.created_at.to_rfc3339()
    );
}

fn print_slot(slot: &PhotoSlot) {
    println!(
        "{:>3}  {}  {}",
        slot.position,
        slot.id,
        slot.cache_key.as_deref().unwrap_or("pending")
    );
}
