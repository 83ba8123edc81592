//! `/stronghold` commands for the stronghold a player stands in and owns.
//!
//!   /stronghold name <name>          : name the stronghold
//!   /stronghold league <group>       : affiliate it with a group
//!   /stronghold stopleague <group>   : end the affiliation

mod executors;

pub use executors::{CommandExecutor, LeagueExecutor, NameExecutor, StopLeagueExecutor};

use crate::schedule::Scheduler;
use crate::store::ClaimRegistry;
use crate::world::{GameProfile, World};

pub const ROOT: &str = "stronghold";

/// What a command reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The stronghold changed.
    Done(String),
    /// Nothing changed; the message says why.
    NoOp(String),
}

impl Reply {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Done(msg) | Self::NoOp(msg) => msg,
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// A parsed `/stronghold` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrongholdCommand {
    Name(String),
    League(String),
    StopLeague(String),
}

impl StrongholdCommand {
    /// Parse the words after `/stronghold`.
    pub fn parse(args: &[&str]) -> Result<Self, Reply> {
        let usage = || Reply::NoOp(format!("Usage: /{ROOT} <name|league|stopleague> <word>"));
        match args {
            ["name", word] => Ok(Self::Name((*word).to_owned())),
            ["league", word] => Ok(Self::League((*word).to_owned())),
            ["stopleague", word] => Ok(Self::StopLeague((*word).to_owned())),
            _ => Err(usage()),
        }
    }

    /// Run the command for `caller`.
    pub fn execute<S, W>(
        &self,
        registry: &mut ClaimRegistry<S>,
        world: &W,
        caller: &GameProfile,
    ) -> Reply
    where
        S: Scheduler,
        W: World + ?Sized,
    {
        match self {
            Self::Name(name) => NameExecutor.execute(registry, world, caller, name),
            Self::League(group) => LeagueExecutor.execute(registry, world, caller, group),
            Self::StopLeague(group) => StopLeagueExecutor.execute(registry, world, caller, group),
        }
    }
}

/// Parse and run one `/stronghold` command line.
pub fn dispatch<S, W>(
    registry: &mut ClaimRegistry<S>,
    world: &W,
    caller: &GameProfile,
    args: &[&str],
) -> Reply
where
    S: Scheduler,
    W: World + ?Sized,
{
    match StrongholdCommand::parse(args) {
        Ok(command) => command.execute(registry, world, caller),
        Err(usage) => usage,
    }
}
