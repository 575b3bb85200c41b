// Command execution

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::report::{InfoReport, ModelReport, Report, SaveReport, SetReport};
use super::{Cli, Command, ReceiverCommand};
use crate::config::{load_settings, Settings};
use crate::receiver::{serial, DynamicModel, Receiver, ReceiverError};
use crate::ubx::messages::{DeviceMask, SectionMask};

/// Run the parsed command line and print the result
pub async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command.clone().unwrap_or_default() {
        // The model table needs neither configuration nor a receiver
        Command::List => {
            print!("{}", Report::model_list().render(cli.json)?);
            return Ok(());
        }
        Command::Receiver(command) => command,
    };

    let settings = load_settings(cli.config.as_deref(), &cli.overrides())?;
    debug!(?settings, "Resolved settings");

    let port = serial::open(&settings.device, settings.baud)?;
    let mut receiver = Receiver::new(port, settings.receiver_options());

    let report = execute(&mut receiver, &command, &settings)
        .await
        .with_context(|| format!("Receiver on {} failed", settings.device))?;

    print!("{}", report.render(cli.json)?);
    Ok(())
}

/// Execute one command against an open receiver session
pub async fn execute<S>(
    receiver: &mut Receiver<S>,
    command: &ReceiverCommand,
    settings: &Settings,
) -> Result<Report>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match command {
        ReceiverCommand::Get { all } => get(receiver, *all).await,
        ReceiverCommand::Set {
            model,
            save,
            force,
            no_verify,
        } => {
            let Some(model) = model.or(settings.model) else {
                bail!(
                    "No dynamic model given\n\
                     Pass one to `gpsmodel set` or set `model` in the configuration file \
                     (see `gpsmodel list`)"
                );
            };
            set(receiver, model, *save, *force, !*no_verify).await
        }
        ReceiverCommand::Save => {
            receiver
                .save_configuration(SectionMask::ALL, DeviceMask::ALL)
                .await
                .context("Failed to save receiver configuration")?;
            Ok(Report::Saved(SaveReport { saved: true }))
        }
        ReceiverCommand::Info => {
            let version = receiver
                .version()
                .await
                .context("Failed to read receiver version")?;
            Ok(Report::Info(InfoReport::from(version)))
        }
    }
}

async fn get<S>(receiver: &mut Receiver<S>, all: bool) -> Result<Report>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let nav5 = receiver
        .navigation_settings()
        .await
        .context("Failed to read navigation settings")?;
    let model =
        DynamicModel::try_from(nav5.dyn_model).map_err(ReceiverError::UnknownModel)?;

    Ok(Report::Model(ModelReport {
        model,
        code: model.code(),
        navigation: all.then_some(nav5),
    }))
}

async fn set<S>(
    receiver: &mut Receiver<S>,
    model: DynamicModel,
    save: bool,
    force: bool,
    verify: bool,
) -> Result<Report>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    receiver.ensure_supported(model).await?;

    let previous_code = receiver
        .navigation_settings()
        .await
        .context("Failed to read navigation settings")?
        .dyn_model;

    let changed = force || previous_code != model.code();
    let mut verified = false;

    if changed {
        receiver
            .set_dynamic_model(model)
            .await
            .with_context(|| format!("Failed to set dynamic model to {}", model))?;

        if verify {
            let actual = receiver
                .dynamic_model()
                .await
                .context("Failed to read back dynamic model")?;
            if actual != model {
                return Err(ReceiverError::VerifyFailed {
                    expected: model,
                    actual,
                }
                .into());
            }
            verified = true;
        }
    } else {
        info!(model = %model, "Receiver already uses this model");
    }

    if save {
        receiver
            .save_configuration(SectionMask::NAV_CONF, DeviceMask::ALL)
            .await
            .context("Failed to save receiver configuration")?;
    }

    Ok(Report::Set(SetReport {
        model,
        code: model.code(),
        previous_code,
        changed,
        verified,
        saved: save,
    }))
}
