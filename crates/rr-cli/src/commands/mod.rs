//! CLI command implementations

mod deploy;

pub use deploy::{
    kill_stale_command, launch_command, participant_command, upload_command, Deployer,
};
