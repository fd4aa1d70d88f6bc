//! Room membership commands: `roomboard join`, `whoami`, `logout`.

use std::path::Path;

use anyhow::{Context, Result};

use roomboard::client::{GateClient, RoomRoute, UserStore};
use roomboard::errors::ClientError;
use roomboard::gate::validate::JoinRequest;

pub fn open_store(path: Option<&Path>) -> Result<UserStore> {
    match path {
        Some(path) => Ok(UserStore::new(path)),
        None => UserStore::default_location(),
    }
}

pub async fn cmd_join(
    store: &UserStore,
    room: &str,
    name: &str,
    email: &str,
    key: &str,
    gate: &str,
) -> Result<()> {
    let route = RoomRoute::parse(room)?;
    let join = JoinRequest {
        name: name.to_string(),
        email: email.to_string(),
        room_id: route.room_id.clone(),
        room_key: key.to_string(),
    };

    let grant = match GateClient::new(gate).request_grant(&join).await {
        Ok(grant) => grant,
        Err(e) => {
            if matches!(e, ClientError::Transport(_)) {
                store.clear_user()?;
            }
            return Err(e.into());
        }
    };

    store.set_user(name, email, &route.room_id, key)?;
    println!("Joined {} as {} <{}>", route.path(), name, email);
    println!(
        "{}",
        serde_json::to_string_pretty(&grant).context("Failed to format session grant")?
    );
    Ok(())
}

pub fn cmd_whoami(store: &UserStore) -> Result<()> {
    let state = store.load()?;
    if !state.is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    println!("Name:  {}", state.name);
    println!("Email: {}", state.email);
    if !state.room_id.is_empty() {
        println!("Room:  {}", state.room_id);
    }
    Ok(())
}

pub fn cmd_logout(store: &UserStore) -> Result<()> {
    store.clear_user()?;
    println!("Signed out.");
    Ok(())
}
