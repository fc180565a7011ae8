//! Demo data set: companies and their contacts, held in memory.
//!
//! Backs the `dv` binary and the integration tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dv_common::{
    col, detail, ColumnDescriptor, Currency, DisplayValue, Error, FileRef, Layout, MenuItem, Money,
    Object, ObjectId, ObjectRef, ObjectSet, Result, SafeHtml, TypeKey, Value,
};

use crate::builder::{DetailsOptions, LazyLoad, TableOptions};
use crate::config::SiteConfig;
use crate::dispatch::{DetailViewDef, ObjectStore};
use crate::lazy::RenderPass;
use crate::site::DetailSite;

pub const APP_LABEL: &str = "companies";

/// 2024-01-15T09:30:00Z
const SEED_EPOCH: i64 = 1_705_311_000;

fn seed_time(hours: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_EPOCH + hours * 3600, 0).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct Company {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub logo: Option<FileRef>,
}

impl Company {
    pub fn type_key() -> TypeKey {
        TypeKey::new(APP_LABEL, "company")
    }
}

/// Sum of completed orders; fixed in the demo.
fn total_order_value() -> Value {
    Currency::new("USD")
        .map(|usd| Value::Money(Money::new(10_000, usd)))
        .unwrap_or(Value::None)
}

impl Object for Company {
    fn type_key(&self) -> TypeKey {
        Company::type_key()
    }

    fn object_id(&self) -> ObjectId {
        ObjectId::from(self.id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn attr(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::Int(self.id as i64),
            "name" => Value::from(self.name.clone()),
            "address" => Value::from(self.address.clone()),
            "phone" => Value::from(self.phone.clone()),
            "email" => Value::from(self.email.clone()),
            "website" => Value::from(self.website.clone()),
            "description" => Value::from(self.description.clone()),
            "created_at" => Value::from(self.created_at),
            "updated_at" => Value::from(self.updated_at),
            "is_active" => Value::Bool(self.is_active),
            "logo" => Value::from(self.logo.clone()),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone)]
pub struct Contact {
    pub id: u64,
    pub company: Arc<Company>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Contact {
    pub fn type_key() -> TypeKey {
        TypeKey::new(APP_LABEL, "contact")
    }
}

impl Object for Contact {
    fn type_key(&self) -> TypeKey {
        Contact::type_key()
    }

    fn object_id(&self) -> ObjectId {
        ObjectId::from(self.id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn attr(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::Int(self.id as i64),
            "company" => Value::Object(self.company.clone()),
            "name" => Value::from(self.name.clone()),
            "phone" => Value::from(self.phone.clone()),
            "email" => Value::from(self.email.clone()),
            "created_at" => Value::from(self.created_at),
            "updated_at" => Value::from(self.updated_at),
            "is_active" => Value::Bool(self.is_active),
            _ => return None,
        };
        Some(value)
    }
}

/// In-memory store with a fixed seed.
#[derive(Debug, Default)]
pub struct DemoStore {
    companies: Vec<Arc<Company>>,
    contacts: Vec<Arc<Contact>>,
}

impl DemoStore {
    /// Three companies with 15, 3 and 0 contacts.
    pub fn seeded() -> Self {
        let specs = [
            ("Acme Corporation", "acme.example", 15, Some("acme.png")),
            ("Globex & Partners", "globex.example", 3, None),
            ("Initech", "initech.example", 0, None),
        ];

        let mut store = DemoStore::default();
        let mut next_contact = 1u64;
        for (index, (name, domain, contact_count, logo)) in specs.into_iter().enumerate() {
            let id = index as u64 + 1;
            let company = Arc::new(Company {
                id,
                name: name.to_string(),
                address: format!("{} Market Street\nSpringfield", 100 * id),
                phone: format!("+1-555-010{id}"),
                email: format!("info@{domain}"),
                website: format!("https://{domain}"),
                description: format!("{name} is a demo company."),
                created_at: seed_time(0),
                updated_at: seed_time(24 * id as i64),
                is_active: id != 3,
                logo: logo.map(|file| FileRef {
                    name: format!("logos/{file}"),
                    url: format!("/media/logos/{file}"),
                }),
            });

            for n in 1..=contact_count {
                store.contacts.push(Arc::new(Contact {
                    id: next_contact,
                    company: company.clone(),
                    name: format!("Contact {n} of {name}"),
                    phone: format!("+1-555-02{next_contact:02}"),
                    email: format!("contact{n}@{domain}"),
                    created_at: seed_time(next_contact as i64),
                    updated_at: seed_time(next_contact as i64 + 1),
                    is_active: n % 4 != 0,
                }));
                next_contact += 1;
            }
            store.companies.push(company);
        }
        store
    }

    pub fn companies(&self) -> &[Arc<Company>] {
        &self.companies
    }

    pub fn contacts(&self) -> &[Arc<Contact>] {
        &self.contacts
    }

    /// Contacts of one company, evaluated on access.
    pub fn contacts_of(&self, company_id: ObjectId) -> CompanyContacts<'_> {
        CompanyContacts {
            store: self,
            company_id,
        }
    }
}

impl ObjectStore for DemoStore {
    fn fetch_object(&self, type_key: &TypeKey, object_id: &ObjectId) -> Option<ObjectRef> {
        if *type_key == Company::type_key() {
            self.companies
                .iter()
                .find(|c| c.object_id() == *object_id)
                .map(|c| c.clone() as ObjectRef)
        } else if *type_key == Contact::type_key() {
            self.contacts
                .iter()
                .find(|c| c.object_id() == *object_id)
                .map(|c| c.clone() as ObjectRef)
        } else {
            None
        }
    }
}

/// Query over one company's contacts, in id order.
pub struct CompanyContacts<'a> {
    store: &'a DemoStore,
    company_id: ObjectId,
}

impl CompanyContacts<'_> {
    fn matching(&self) -> impl Iterator<Item = &Arc<Contact>> {
        self.store
            .contacts
            .iter()
            .filter(|c| c.company.object_id() == self.company_id)
    }
}

impl ObjectSet for CompanyContacts<'_> {
    fn count(&self) -> usize {
        self.matching().count()
    }

    fn head(&self, limit: Option<usize>) -> Vec<ObjectRef> {
        self.matching()
            .take(limit.unwrap_or(usize::MAX))
            .map(|c| c.clone() as ObjectRef)
            .collect()
    }
}

fn company_details() -> Vec<ColumnDescriptor> {
    vec![
        detail("id"),
        detail("name"),
        detail("address"),
        detail("website"),
        detail("created_at"),
        detail("logo"),
        detail("total_completed_order_amount").with_value_fn(|_| total_order_value()),
    ]
}

fn contact_columns() -> Vec<ColumnDescriptor> {
    vec![
        col("id"),
        col("name"),
        col("phone"),
        col("email"),
        col("created_at"),
        col("updated_at"),
        col("is_active"),
        col("none").with_value_fn(|_| Value::None),
    ]
}

fn email_action(contact: &dyn Object) -> DisplayValue {
    match contact.attr("email") {
        Some(Value::Text(email)) if !email.is_empty() => {
            DisplayValue::Html(SafeHtml::link(&format!("mailto:{email}"), "Email"))
        }
        _ => DisplayValue::text(""),
    }
}

fn contact_table_options(pass: &RenderPass<'_>, company_id: &ObjectId) -> TableOptions {
    pass.table_options()
        .panel_name("Contact List")
        .view_all_url(format!(
            "/{}/{}/contact/?company__id__exact={}",
            pass.routes().namespace(),
            APP_LABEL,
            company_id
        ))
        .row_action(email_action)
}

/// Company page: details beside an empty slot, then a lazy contact table.
pub fn company_view(store: Arc<DemoStore>) -> DetailViewDef {
    let producer_store = store.clone();
    DetailViewDef::new(Company::type_key(), move |pass, subject| {
        let details = pass.details_for(
            subject,
            &company_details(),
            DetailsOptions::new().panel_name("Company Details"),
        )?;
        let contacts = store.contacts_of(subject.object_id());
        let options = contact_table_options(pass, &subject.object_id())
            .lazy(LazyLoad::new("contacts").with_placeholder("Loading contacts..."));
        let contact_list = pass.table_for(&contacts, &contact_columns(), options)?;

        Ok(Layout::new()
            .row(vec![Some(details), None])
            .header("Contacts")
            .row(vec![Some(contact_list)]))
    })
    .lazy("contacts", move |pass, subject| {
        let contacts = producer_store.contacts_of(subject.object_id());
        let options = contact_table_options(pass, &subject.object_id());
        pass.table_for(&contacts, &contact_columns(), options)
    })
    .menu_item(
        MenuItem::new("Visit Google", "https://www.google.com")
            .with_target("_blank")
            .with_confirm("Go to Google?"),
    )
}

fn contact_details() -> Vec<ColumnDescriptor> {
    vec![
        detail("id"),
        detail("name"),
        detail("company"),
        detail("phone"),
        detail("email"),
        detail("created_at"),
        detail("updated_at"),
        detail("is_active"),
    ]
}

fn related_company(subject: &dyn Object) -> Result<ObjectRef> {
    subject
        .attr("company")
        .and_then(|value| value.as_object().cloned())
        .ok_or_else(|| Error::AttributeResolution {
            path: "company".to_string(),
            segment: "company".to_string(),
            type_name: subject.type_name(),
        })
}

/// Contact page: contact details beside lazily loaded company details.
pub fn contact_view() -> DetailViewDef {
    DetailViewDef::new(Contact::type_key(), |pass, subject| {
        let details = pass.details_for(
            subject,
            &contact_details(),
            DetailsOptions::new().panel_name("Contact Details"),
        )?;
        let company = related_company(subject.as_ref())?;
        let company_panel = pass.details_for(
            &company,
            &company_details(),
            DetailsOptions::new()
                .panel_name("Company Details")
                .lazy(LazyLoad::new("company")),
        )?;
        Ok(Layout::new().row(vec![Some(details), Some(company_panel)]))
    })
    .title(|subject| format!("Contact: {}", subject.label()))
    .lazy("company", |pass, subject| {
        let company = related_company(subject.as_ref())?;
        pass.details_for(
            &company,
            &company_details(),
            DetailsOptions::new().panel_name("Company Details"),
        )
    })
}

/// Site over the seeded store with both views registered.
pub fn demo_site(config: SiteConfig) -> Result<DetailSite> {
    let store = Arc::new(DemoStore::seeded());
    let mut site = DetailSite::new(config, store.clone())?;
    site.register(company_view(store))?;
    site.register(contact_view())?;
    Ok(site)
}
