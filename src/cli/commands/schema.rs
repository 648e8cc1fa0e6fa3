//! `qms schema` command - print table definitions

use miette::Result;

use crate::store::schema::{hosted_ddl, EMBEDDED_DDL};

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Print the PostgreSQL DDL to apply on the hosted service
    #[arg(long)]
    pub hosted: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    if args.hosted {
        print!("{}", hosted_ddl());
    } else {
        print!("{}", EMBEDDED_DDL);
    }
    Ok(())
}
