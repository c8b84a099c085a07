//! The table that maps command verbs to their handlers. It is built once, when the server is
//! built, and shared read-only by all sessions afterwards.

use super::{commands, handler::CommandHandler};
use crate::{auth::UserDetail, storage::Driver};
use std::collections::HashMap;

#[derive(Debug)]
pub(crate) struct CommandEntry<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub handler: Box<dyn CommandHandler<D, U>>,
    // Whether the session must be logged in before the handler runs.
    pub requires_auth: bool,
}

#[derive(Debug)]
pub(crate) struct DispatchTable<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    entries: HashMap<&'static str, CommandEntry<D, U>>,
    unsupported: CommandEntry<D, U>,
}

impl<D, U> DispatchTable<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub fn new() -> Self {
        let mut table = DispatchTable {
            entries: HashMap::new(),
            unsupported: CommandEntry {
                handler: Box::new(commands::Unsupported),
                requires_auth: false,
            },
        };

        // Usable before logging in
        table.public("USER", commands::User);
        table.public("PASS", commands::Pass);
        table.public("QUIT", commands::Quit);
        table.public("FEAT", commands::Feat);
        table.public("SYST", commands::Syst);
        table.public("NOOP", commands::Noop);
        table.public("HELP", commands::Help);

        table.protected("PWD", commands::Pwd);
        table.protected("XPWD", commands::Pwd);
        table.protected("CWD", commands::Cwd);
        table.protected("XCWD", commands::Cwd);
        table.protected("CDUP", commands::Cdup);
        table.protected("XCUP", commands::Cdup);
        table.protected("TYPE", commands::Type);
        table.protected("MODE", commands::Mode);
        table.protected("STRU", commands::Stru);
        table.protected("PORT", commands::Port);
        table.protected("EPRT", commands::Eprt);
        table.protected("PASV", commands::Pasv);
        table.protected("EPSV", commands::Epsv);
        table.protected("RETR", commands::Retr);
        table.protected("STOR", commands::Stor);
        table.protected("APPE", commands::Appe);
        table.protected("LIST", commands::List);
        table.protected("NLST", commands::Nlst);
        table.protected("DELE", commands::Dele);
        table.protected("RNFR", commands::Rnfr);
        table.protected("RNTO", commands::Rnto);
        table.protected("MKD", commands::Mkd);
        table.protected("XMKD", commands::Mkd);
        table.protected("RMD", commands::Rmd);
        table.protected("XRMD", commands::Rmd);
        table.protected("SIZE", commands::Size);
        table.protected("MDTM", commands::Mdtm);
        table.protected("REST", commands::Rest);
        table.protected("ABOR", commands::Abor);
        table.protected("ALLO", commands::Allo);
        table.protected("OPTS", commands::Opts);
        table.protected("STAT", commands::Stat);

        table
    }

    fn public<H: CommandHandler<D, U> + 'static>(&mut self, verb: &'static str, handler: H) {
        self.entries.insert(
            verb,
            CommandEntry {
                handler: Box::new(handler),
                requires_auth: false,
            },
        );
    }

    fn protected<H: CommandHandler<D, U> + 'static>(&mut self, verb: &'static str, handler: H) {
        self.entries.insert(
            verb,
            CommandEntry {
                handler: Box::new(handler),
                requires_auth: true,
            },
        );
    }

    /// The entry for `verb`, or the fallback that answers every unknown verb.
    pub fn lookup(&self, verb: &str) -> &CommandEntry<D, U> {
        self.entries.get(verb).unwrap_or(&self.unsupported)
    }

    /// All registered verbs in alphabetical order.
    pub fn verbs(&self) -> Vec<&'static str> {
        let mut verbs: Vec<&'static str> = self.entries.keys().copied().collect();
        verbs.sort_unstable();
        verbs
    }
}
