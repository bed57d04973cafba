//! spellcfg language server over stdio

use spellcfg_lsp::SpellConfigServer;
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr
    spellcfg_core::init_tracing();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(SpellConfigServer::new)
        .custom_method(
            "spellcfg/registerConfigurationFile",
            SpellConfigServer::register_configuration_file,
        )
        .custom_method(
            "spellcfg/getConfigForDocument",
            SpellConfigServer::get_config_for_document,
        )
        .custom_method(
            "spellcfg/addWordsToConfigFile",
            SpellConfigServer::add_words_to_config_file,
        )
        .finish();

    tracing::info!("spellcfg-lsp {} listening on stdio", spellcfg_lsp::VERSION);
    Server::new(stdin, stdout, socket).serve(service).await;
}
