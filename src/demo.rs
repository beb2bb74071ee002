//! Built-in storefront fixture for `ui-exerciser demo`.
//!
//! A landing page with a header, hero, pricing cards, an intake form and a
//! footer, wired so that a run over it produces every outcome class.

use crate::page::{MockDocument, MockElement, MockPage, NodeId};
use crate::probe::OPT_OUT_ATTRIBUTE;

pub const STOREFRONT_URL: &str = "http://storefront.test/";
pub const STOREFRONT_TITLE: &str = "ZapBot Storefront";

/// Handles of the interesting nodes in the fixture, in discovery order
#[derive(Debug, Clone, Copy)]
pub struct Storefront {
    pub menu: NodeId,
    pub login: NodeId,
    pub signup: NodeId,
    pub upload: NodeId,
    pub submit: NodeId,
    pub coupon: NodeId,
    pub back_to_top: NodeId,
    pub plan_card: NodeId,
    pub pay_link: NodeId,
    pub generate: NodeId,
    pub name_field: NodeId,
    pub file_field: NodeId,
}

/// Build the storefront page
pub fn storefront() -> (MockPage, Storefront) {
    let mut doc = MockDocument::new(STOREFRONT_URL, STOREFRONT_TITLE);

    let header = doc.append(None, MockElement::new("header").attr("data-component", "Header"));
    let nav = doc.append(Some(header), MockElement::new("nav"));
    doc.append(Some(nav), MockElement::new("a").attr("href", "#recursos").text("Recursos"));
    let menu = doc.append(Some(nav), MockElement::new("button").class("nav-toggle").text("Menu"));
    let login = doc.append(
        Some(header),
        MockElement::new("button").text("Entrar").on_activate(|doc| {
            doc.set_title("Entrar | ZapBot");
            Ok(())
        }),
    );
    doc.append(
        Some(header),
        MockElement::new("button")
            .attr(OPT_OUT_ATTRIBUTE, "")
            .text("Testar Botões"),
    );

    let main = doc.append(None, MockElement::new("main").class("LandingPage"));
    let hero = doc.append(Some(main), MockElement::new("section").attr("data-component", "HeroSection"));
    let signup = doc.append(
        Some(hero),
        MockElement::new("button")
            .class("bg-green-600")
            .text("Criar Conta e Começar")
            .on_activate(|doc| {
                doc.navigate("http://storefront.test/#formulario");
                Ok(())
            }),
    );
    doc.append(Some(hero), MockElement::new("button").text("Admin").display("none"));

    let pricing = doc.append(Some(main), MockElement::new("section").attr("data-component", "Pricing"));
    let plan_card = doc.append(
        Some(pricing),
        MockElement::new("div")
            .class("PlanCard")
            .attr("role", "button")
            .text("Plano Pro")
            .on_activate(|doc| {
                let dialog = MockElement::new("div").attr("role", "dialog").text("Plano Pro selecionado");
                doc.append(None, dialog);
                Ok(())
            }),
    );
    let pay_link = doc.append(
        Some(pricing),
        MockElement::new("a")
            .class("btn-primary")
            .attr("href", "/checkout")
            .text("Pagar agora"),
    );

    let form = doc.append(Some(main), MockElement::new("form").class("BusinessFormComponent"));
    let name_field = doc.append(Some(form), MockElement::new("input").attr("name", "business").value("Ana Doces"));
    let file_field = doc.append(Some(form), MockElement::new("input").attr("type", "file").value(""));
    let upload = doc.append(
        Some(form),
        MockElement::new("button")
            .attr("type", "button")
            .text("Escolher Arquivo")
            .on_activate(move |doc| {
                doc.set_value(file_field, "cardapio.pdf");
                Ok(())
            }),
    );
    let submit = doc.append(
        Some(form),
        MockElement::new("button")
            .attr("type", "submit")
            .text("Continuar para Pagamento")
            .on_activate(move |doc| {
                doc.append(Some(form), MockElement::new("p").class("error").text("Informe o WhatsApp"));
                let coupon = doc
                    .document_order()
                    .into_iter()
                    .find(|id| doc.attribute(*id, "name") == Some("coupon"));
                if let Some(coupon) = coupon {
                    doc.set_attribute(coupon, "disabled", "");
                }
                Ok(())
            }),
    );
    let coupon = doc.append(
        Some(form),
        MockElement::new("button")
            .attr("type", "button")
            .attr("name", "coupon")
            .text("Aplicar cupom"),
    );
    let generate = doc.append(
        Some(form),
        MockElement::new("span")
            .attr("onclick", "generateScript()")
            .attr("data-testid", "generate-button")
            .text("Gerar script")
            .on_activate(|_| Err("checkout session unavailable".to_string())),
    );

    let footer = doc.append(None, MockElement::new("footer"));
    let back_to_top = doc.append(Some(footer), MockElement::new("button").text("Voltar ao topo"));

    let nodes = Storefront {
        menu,
        login,
        signup,
        upload,
        submit,
        coupon,
        back_to_top,
        plan_card,
        pay_link,
        generate,
        name_field,
        file_field,
    };
    (MockPage::new(doc), nodes)
}
