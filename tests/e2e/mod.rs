pub mod replay_cli;
