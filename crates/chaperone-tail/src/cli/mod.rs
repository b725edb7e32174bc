/*
[INPUT]:  CLI subcommands that do not need a running console
[OUTPUT]: Command implementations
[POS]:    CLI layer
[UPDATE]: When adding standalone subcommands
*/

pub mod init;
