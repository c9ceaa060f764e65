//! The event loop: decide what each inbound event needs, then run it.
//!
//! Events are handled one at a time in arrival order. Per-event failures end
//! in an apology to the channel; only rejected credentials stop the loop.

use std::sync::Arc;

use faceswap_core::command::{self, APOLOGY_TEXT, HELP_TEXT};
use faceswap_core::{
    AttachedFile, ChatOutbound, Command, FaceswapConfig, FaceswapError, InboundEvent,
    PlatformEvent, Upload, UploadNamer,
};
use faceswap_media::{
    FileFetcher, ReferencePaths, TempFileHandle, TempFileStore, TransformRequest, Transformer,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub struct Dispatcher {
    bot_user_id: String,
    fetcher: Arc<dyn FileFetcher>,
    store: TempFileStore,
    transformer: Arc<dyn Transformer>,
    outbound: Arc<dyn ChatOutbound>,
    namer: UploadNamer,
    refs: ReferencePaths,
    upload_title: String,
}

impl Dispatcher {
    pub fn new(
        config: &FaceswapConfig,
        bot_user_id: impl Into<String>,
        fetcher: Arc<dyn FileFetcher>,
        transformer: Arc<dyn Transformer>,
        outbound: Arc<dyn ChatOutbound>,
    ) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            fetcher,
            store: TempFileStore::new(config.scratch_dir.as_deref()),
            transformer,
            outbound,
            namer: UploadNamer::from_file(
                config.upload.word_list.as_deref(),
                config.upload.default_name.clone(),
            ),
            refs: ReferencePaths::from_config(&config.transform),
            upload_title: config.upload.title.clone(),
        }
    }

    /// Consume events until the stream closes or credentials are rejected.
    pub async fn run(&self, mut events: mpsc::Receiver<PlatformEvent>) -> faceswap_core::Result<()> {
        info!(platform = self.outbound.name(), "dispatcher started");
        while let Some(event) = events.recv().await {
            match event {
                PlatformEvent::Message(message) => self.handle_message(message).await,
                PlatformEvent::ConnectionError(reason) => {
                    warn!(error = %reason, "realtime connection error");
                }
                PlatformEvent::InvalidAuth(reason) => {
                    error!(error = %reason, "credentials rejected, stopping");
                    return Err(FaceswapError::AuthFailed(reason));
                }
            }
        }
        info!("event stream closed");
        Ok(())
    }

    pub async fn handle_message(&self, event: InboundEvent) {
        if event.sender_id == self.bot_user_id {
            return;
        }
        if !command::mentions(&event.text, &self.bot_user_id) {
            return;
        }
        let text = command::strip_mention(&event.text, &self.bot_user_id);

        let Some(file) = event.attached_file.as_ref() else {
            if command::is_help_request(&text) {
                debug!(channel = %event.channel_id, "help requested");
                self.reply(&event.channel_id, HELP_TEXT).await;
            }
            return;
        };

        if !file.is_accepted() {
            info!(
                channel = %event.channel_id,
                extension = %file.declared_extension,
                "unsupported file type"
            );
            self.reply(&event.channel_id, &command::unsupported_type_text())
                .await;
            return;
        }

        let command = command::classify(&text);
        let span = info_span!(
            "event",
            event_id = %event.id,
            channel = %event.channel_id,
            sender = %event.sender_id,
            operation = %command.operation,
        );

        async {
            match self.process(&event.channel_id, file, command).await {
                Ok(()) => info!("image processed"),
                Err(e) => {
                    error!(code = e.code(), error = %e, "image processing failed");
                    self.reply(&event.channel_id, APOLOGY_TEXT).await;
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch, store, transform and upload. The input file is released here
    /// whatever happens after it was saved.
    async fn process(
        &self,
        channel_id: &str,
        file: &AttachedFile,
        command: Command,
    ) -> faceswap_core::Result<()> {
        let bytes = self.fetcher.fetch(&file.download_url).await?;
        let mut input = self.store.save(&bytes, &file.declared_extension)?;
        debug!(path = %input.path().display(), "input saved");

        let result = self.transform_and_upload(channel_id, &input, command).await;
        input.release();
        result
    }

    async fn transform_and_upload(
        &self,
        channel_id: &str,
        input: &TempFileHandle,
        command: Command,
    ) -> faceswap_core::Result<()> {
        let request = TransformRequest::new(input.path(), command, &self.refs);
        let mut output = self.transformer.invoke(&request).await?;

        let result = self.upload(channel_id, &output).await;
        output.release();
        result
    }

    async fn upload(&self, channel_id: &str, output: &TempFileHandle) -> faceswap_core::Result<()> {
        let bytes = tokio::fs::read(output.path()).await?;
        let upload = Upload {
            channel_id: channel_id.to_string(),
            file_name: self.namer.file_name(output.extension()),
            title: self.upload_title.clone(),
            bytes,
        };
        self.outbound.upload_file(upload).await
    }

    async fn reply(&self, channel_id: &str, text: &str) {
        if let Err(e) = self.outbound.send_text(channel_id, text).await {
            warn!(channel = %channel_id, error = %e, "failed to send reply");
        }
    }
}
