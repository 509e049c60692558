use anyhow::Result;
use clap::Parser;

use simview::{
    EntityKind, Request, RequestFlags, Response, Session, SessionError, TransportError, WorldStore,
};

#[derive(Parser)]
#[command(name = "simview-client")]
#[command(about = "Mirrors a simulation server's world over a framed msgpack link")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = simview::DEFAULT_PORT)]
    port: u16,

    #[arg(long, help = "Ask for the full world, map and config up front")]
    full: bool,

    #[arg(long, help = "Start receiving from this time step")]
    time: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let mut flags = RequestFlags::OPEN;
    if args.full {
        flags |= RequestFlags::WORLD | RequestFlags::MAP | RequestFlags::CONFIG;
    }
    let mut open = Request::new(flags);
    if let Some(time) = args.time {
        open = open.with_time(time);
    }

    let mut session = Session::connect(&addr)?;
    log::info!("session opened against {addr}");
    session.send(&open)?;

    loop {
        match session.receive() {
            Ok(response) => log_tick(session.world(), &response),
            Err(SessionError::Closed | SessionError::Aborted) => {
                log::info!("session ended");
                break;
            }
            Err(SessionError::Transport(TransportError::Closed)) => {
                log::info!("server closed the connection");
                break;
            }
            Err(SessionError::Transport(e)) => {
                log::warn!("session ended: {e}");
                break;
            }
            // An undecodable payload means we lost framing sync with the
            // server; surface it instead of guessing a resync point.
            Err(e @ SessionError::Codec(_)) => return Err(e.into()),
        }
    }

    session.close();
    Ok(())
}

fn log_tick(world: &WorldStore, response: &Response) {
    log::info!(
        "t={}/{} map={} entities={} (roads={} buildings={} civilians={}) actions={} message={:?}",
        world.time(),
        world.max_time_step(),
        world.map_name().unwrap_or("?"),
        world.entity_count(),
        world.count_of(EntityKind::Road),
        world.count_of(EntityKind::Building),
        world.count_of(EntityKind::Civilian),
        world.actions().len(),
        response.message,
    );
}
