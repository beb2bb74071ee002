//! End-to-end runs against the in-memory page.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use ui_exerciser::config::TimingSettings;
use ui_exerciser::demo;
use ui_exerciser::page::{MockDocument, MockElement, MockPage, NodeId, Page};
use ui_exerciser::probe::{ActionCategory, ProbeStatus, Selectors, discover, probe};
use ui_exerciser::{Exerciser, ExerciserConfig, RunError};

fn page_with(build: impl FnOnce(&mut MockDocument) -> NodeId) -> (MockPage, NodeId) {
    let mut doc = MockDocument::new("http://app.test/", "App");
    let id = build(&mut doc);
    (MockPage::new(doc), id)
}

fn detail(outcome: &ui_exerciser::ProbeOutcome) -> &str {
    outcome.detail.as_deref().unwrap_or("")
}

#[tokio::test]
async fn button_without_handler_is_a_warning() {
    let (page, button) = page_with(|doc| doc.append(None, MockElement::new("button").text("Nada")));

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Warning);
    assert_eq!(detail(&outcome), "activation executed, no change detected");
    assert_eq!(page.activation_count(button), 1);
}

#[tokio::test]
async fn button_styled_link_that_navigates_is_a_success() {
    let (page, link) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("a").class("btn").attr("href", "/pricing").text("Planos"),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &link).await;
    assert_eq!(outcome.status, ProbeStatus::Success);
    assert!(detail(&outcome).contains("http://app.test/pricing"));
    assert_eq!(outcome.action_category, ActionCategory::Link);
}

#[tokio::test]
async fn disabled_button_is_never_activated() {
    let (page, button) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("button").text("Pagar").disabled().on_activate(|doc| {
                doc.navigate("http://app.test/paid");
                Ok(())
            }),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Warning);
    assert_eq!(detail(&outcome), "element disabled");
    assert_eq!(page.total_activations(), 0);
    assert_eq!(page.current_url().await.unwrap(), "http://app.test/");
}

#[tokio::test]
async fn aria_disabled_element_is_never_activated() {
    let (page, card) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("div")
                .attr("role", "button")
                .attr("aria-disabled", "true")
                .text("Card"),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &card).await;
    assert_eq!(detail(&outcome), "element disabled");
    assert_eq!(page.activation_count(card), 0);
}

#[tokio::test]
async fn throwing_handler_reports_its_message() {
    let (page, button) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("button")
                .text("Gerar")
                .on_activate(|_| Err("TypeError: session is undefined".to_string())),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Error);
    assert_eq!(detail(&outcome), "TypeError: session is undefined");
}

#[tokio::test]
async fn new_error_surface_is_a_regression() {
    let (page, button) = page_with(|doc| {
        doc.append(None, MockElement::new("p").class("error").text("old problem"));
        doc.append(
            None,
            MockElement::new("button").text("Salvar").on_activate(|doc| {
                doc.append(None, MockElement::new("div").attr("role", "alert").text("falhou"));
                // navigation alone would be a success; the regression wins
                doc.navigate("http://app.test/after");
                Ok(())
            }),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Error);
    assert_eq!(detail(&outcome), "new errors detected");
}

#[tokio::test]
async fn existing_errors_alone_are_not_a_regression() {
    let (page, button) = page_with(|doc| {
        doc.append(None, MockElement::new("p").class("error").text("old problem"));
        doc.append(None, MockElement::new("button").text("Nada"))
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Warning);
}

#[tokio::test]
async fn title_change_is_a_success() {
    let (page, button) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("button").text("Abrir").on_activate(|doc| {
                doc.set_title("Checkout");
                Ok(())
            }),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Success);
    assert_eq!(detail(&outcome), "title changed to Checkout");
}

#[tokio::test]
async fn overlay_is_a_success() {
    let (page, button) = page_with(|doc| {
        doc.append(
            None,
            MockElement::new("button").text("Ajuda").on_activate(|doc| {
                doc.append(None, MockElement::new("div").class("toast").text("Copiado"));
                Ok(())
            }),
        )
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Success);
    assert_eq!(detail(&outcome), "modal or notification shown");
}

#[tokio::test]
async fn prefilled_form_is_not_mistaken_for_a_change() {
    let (page, button) = page_with(|doc| {
        doc.append(None, MockElement::new("input").attr("name", "email").value("ana@shop.test"));
        doc.append(None, MockElement::new("button").text("Nada"))
    });

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Warning);
}

#[tokio::test]
async fn filled_form_field_is_a_success() {
    let mut doc = MockDocument::new("http://app.test/", "App");
    let field = doc.append(None, MockElement::new("textarea").value(""));
    let button = doc.append(
        None,
        MockElement::new("button").text("Exemplo").on_activate(move |doc| {
            doc.set_value(field, "Olá! Como posso ajudar?");
            Ok(())
        }),
    );
    let page = MockPage::new(doc);

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Success);
    assert_eq!(detail(&outcome), "form was modified");
}

#[tokio::test]
async fn inline_style_is_restored_after_probing() {
    let mut doc = MockDocument::new("http://app.test/", "App");
    let plain = doc.append(None, MockElement::new("button").text("A"));
    let styled = doc.append(None, MockElement::new("button").text("B").inline_style("color: red;"));
    let failing = doc.append(
        None,
        MockElement::new("button")
            .text("C")
            .inline_style("margin: 0")
            .on_activate(|_| Err("boom".to_string())),
    );
    let page = MockPage::new(doc);
    let config = ExerciserConfig::immediate();

    for id in [plain, styled, failing] {
        probe(&page, &config, &id).await;
    }

    assert_eq!(page.inline_style(&plain).await.unwrap(), "");
    assert_eq!(page.inline_style(&styled).await.unwrap(), "color: red;");
    assert_eq!(page.inline_style(&failing).await.unwrap(), "margin: 0");
}

#[tokio::test]
async fn element_removed_by_its_own_activation_is_still_classified() {
    let mut doc = MockDocument::new("http://app.test/", "App");
    let banner = doc.append(None, MockElement::new("div").attr("data-component", "CookieBanner"));
    let button = doc.append(Some(banner), MockElement::new("button").text("Aceitar"));
    doc.set_handler(button, move |doc| {
        doc.remove(banner);
        doc.append(None, MockElement::new("div").class("toast").text("Preferências salvas"));
        Ok(())
    });
    let page = MockPage::new(doc);

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Success);
    assert_eq!(outcome.location, "/ > CookieBanner");
}

#[tokio::test]
async fn detached_element_becomes_an_error_outcome() {
    let mut doc = MockDocument::new("http://app.test/", "App");
    let button = doc.append(None, MockElement::new("button").text("Gone"));
    doc.remove(button);
    let page = MockPage::new(doc);

    let outcome = probe(&page, &ExerciserConfig::immediate(), &button).await;
    assert_eq!(outcome.status, ProbeStatus::Error);
    assert!(outcome.detail.is_some());
    assert_eq!(page.total_activations(), 0);
}

#[tokio::test]
async fn run_produces_one_outcome_per_discovered_element() {
    let (page, nodes) = demo::storefront();
    let discovered = discover(&page, &Selectors::default()).await.unwrap();
    assert_eq!(
        discovered,
        vec![
            nodes.menu,
            nodes.login,
            nodes.signup,
            nodes.upload,
            nodes.submit,
            nodes.coupon,
            nodes.back_to_top,
            nodes.plan_card,
            nodes.pay_link,
            nodes.generate,
        ]
    );

    let exerciser = Exerciser::new(ExerciserConfig::immediate());
    let report = exerciser.run(&page, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.discovered, 10);
    assert_eq!(report.outcomes.len(), 10);
    assert!(!report.cancelled);
    assert!(report.failure.is_none());

    let observed: Vec<(&str, ProbeStatus, &str)> = report
        .outcomes
        .iter()
        .map(|o| (o.label.as_str(), o.status, detail(o)))
        .collect();
    assert_eq!(
        observed,
        vec![
            ("Menu", ProbeStatus::Warning, "activation executed, no change detected"),
            ("Entrar", ProbeStatus::Success, "title changed to Entrar | ZapBot"),
            (
                "Criar Conta e Começar",
                ProbeStatus::Success,
                "navigated to http://storefront.test/#formulario"
            ),
            ("Escolher Arquivo", ProbeStatus::Success, "form was modified"),
            ("Continuar para Pagamento", ProbeStatus::Error, "new errors detected"),
            ("Aplicar cupom", ProbeStatus::Warning, "element disabled"),
            ("Voltar ao topo", ProbeStatus::Warning, "activation executed, no change detected"),
            ("Plano Pro", ProbeStatus::Success, "modal or notification shown"),
            ("Pagar agora", ProbeStatus::Success, "navigated to http://storefront.test/checkout"),
            ("Gerar script", ProbeStatus::Error, "checkout session unavailable"),
        ]
    );

    let categories: Vec<ActionCategory> = report.outcomes.iter().map(|o| o.action_category).collect();
    assert_eq!(
        categories,
        vec![
            ActionCategory::Navigation,
            ActionCategory::Authentication,
            ActionCategory::Registration,
            ActionCategory::General,
            ActionCategory::Payment,
            ActionCategory::General,
            ActionCategory::Navigation,
            ActionCategory::General,
            ActionCategory::Payment,
            ActionCategory::General,
        ]
    );
    assert_eq!(report.outcomes[0].location, "/ > nav");
    assert_eq!(report.outcomes[7].location, "/ > Pricing");
    assert_eq!(report.outcomes[9].location, "/checkout > BusinessFormComponent");

    assert_eq!(report.summary.total, 10);
    assert_eq!(report.summary.success, 5);
    assert_eq!(report.summary.warning, 3);
    assert_eq!(report.summary.error, 2);
    assert_eq!(page.activation_count(nodes.coupon), 0);

    let snapshot = exerciser.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.current_label, None);
    assert_eq!(snapshot.outcomes, report.outcomes);
}

#[tokio::test]
async fn each_run_starts_from_an_empty_list() {
    let (page, _) = page_with(|doc| doc.append(None, MockElement::new("button").text("Nada")));
    let exerciser = Exerciser::new(ExerciserConfig::immediate());
    let cancel = CancellationToken::new();

    exerciser.run(&page, &cancel).await.unwrap();
    let second = exerciser.run(&page, &cancel).await.unwrap();
    assert_eq!(second.outcomes.len(), 1);
    assert_eq!(exerciser.snapshot().outcomes.len(), 1);
}

#[tokio::test]
async fn published_snapshots_are_prefixes_of_the_final_list() {
    let (page, _) = demo::storefront();
    let exerciser = Exerciser::new(ExerciserConfig::immediate());
    let mut updates = exerciser.subscribe();

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            seen.push(snapshot.outcomes);
        }
        seen
    });

    let report = exerciser.run(&page, &CancellationToken::new()).await.unwrap();
    drop(exerciser);
    let seen = collector.await.unwrap();

    assert!(!seen.is_empty());
    for partial in seen {
        assert!(partial.len() <= report.outcomes.len());
        assert_eq!(partial[..], report.outcomes[..partial.len()]);
    }
}

#[tokio::test]
async fn cancelled_run_keeps_partial_results() {
    let (page, nodes) = demo::storefront();
    let exerciser = Exerciser::new(ExerciserConfig::immediate());
    let cancel = CancellationToken::new();

    // cancel from inside the second activation; that probe still completes
    page.with_document(|doc| {
        let token = cancel.clone();
        doc.set_handler(nodes.login, move |doc| {
            doc.set_title("Entrar | ZapBot");
            token.cancel();
            Ok(())
        });
    });

    let report = exerciser.run(&page, &cancel).await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.discovered, 10);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[1].label, "Entrar");
    assert_eq!(report.summary.total, 2);
    assert_eq!(page.activation_count(nodes.signup), 0);
    assert!(!exerciser.is_running());
}

#[tokio::test]
async fn already_cancelled_run_probes_nothing() {
    let (page, _) = demo::storefront();
    let exerciser = Exerciser::new(ExerciserConfig::immediate());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = exerciser.run(&page, &cancel).await.unwrap();
    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
    assert_eq!(page.total_activations(), 0);
}

#[tokio::test]
async fn inter_probe_pause_wakes_on_cancel() {
    let (page, _) = demo::storefront();
    let timings = TimingSettings {
        inter_probe_ms: 60_000,
        ..TimingSettings::immediate()
    };
    let exerciser = Exerciser::new(ExerciserConfig::immediate().with_timings(timings));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(10), exerciser.run(&page, &cancel))
        .await
        .expect("run should stop promptly")
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.outcomes.len(), 1);
}

#[tokio::test]
async fn second_concurrent_run_is_rejected() {
    let (page, _) = demo::storefront();
    let timings = TimingSettings {
        inter_probe_ms: 20,
        ..TimingSettings::immediate()
    };
    let exerciser = Arc::new(Exerciser::new(ExerciserConfig::immediate().with_timings(timings)));
    let page = Arc::new(page);
    let cancel = CancellationToken::new();

    let first = {
        let exerciser = exerciser.clone();
        let page = page.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { exerciser.run(page.as_ref(), &cancel).await })
    };

    // wait until the first run has published progress
    let mut updates = exerciser.subscribe();
    while !updates.borrow_and_update().is_running {
        updates.changed().await.unwrap();
    }

    let second = exerciser.run(page.as_ref(), &cancel).await;
    assert_eq!(second, Err(RunError::AlreadyRunning));

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.outcomes.len(), 10);
    assert!(!exerciser.is_running());
}

#[tokio::test]
async fn discovery_failure_is_reported_and_releases_the_run() {
    let (page, _) = page_with(|doc| doc.append(None, MockElement::new("button").text("Nada")));
    let mut config = ExerciserConfig::immediate();
    config.selectors.candidates[0].selector = "main > button".to_string();
    let exerciser = Exerciser::new(config);

    let report = exerciser.run(&page, &CancellationToken::new()).await.unwrap();
    assert!(report.failure.is_some());
    assert!(report.outcomes.is_empty());
    assert!(!report.cancelled);
    assert!(!exerciser.is_running());
}
