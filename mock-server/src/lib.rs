use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Body of a create or update. A client-sent `id` is ignored.
#[derive(Deserialize)]
pub struct PokemonInput {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sort {
    pub sorted: bool,
    pub unsorted: bool,
    pub empty: bool,
}

/// Spring-style page envelope; `number` is zero-based.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    pub content: Vec<Pokemon>,
    pub last: bool,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
    pub first: bool,
    pub number_of_elements: usize,
    pub sort: Sort,
}

impl PageBody {
    pub fn slice(all: Vec<Pokemon>, page: usize, size: usize) -> Self {
        let total_elements = all.len();
        let total_pages = total_elements.div_ceil(size);
        let content: Vec<Pokemon> = all
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            last: page.saturating_add(1) >= total_pages,
            total_elements,
            total_pages,
            size,
            number: page,
            first: page == 0,
            number_of_elements: content.len(),
            content,
            sort: Sort {
                sorted: false,
                unsorted: true,
                empty: true,
            },
        }
    }
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    pokemon: BTreeMap<u64, Pokemon>,
}

impl Store {
    fn insert(&mut self, input: PokemonInput) -> Pokemon {
        self.next_id += 1;
        let pokemon = Pokemon {
            id: self.next_id,
            name: input.name,
            types: input.types,
        };
        self.pokemon.insert(pokemon.id, pokemon.clone());
        pokemon
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pokemon", get(list_pokemon).post(create_pokemon))
        .route(
            "/api/pokemon/{id}",
            get(get_pokemon).put(update_pokemon).delete(delete_pokemon),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> &'static str {
    "ok"
}

/// `name` looks one record up (`{}` when absent), `page`/`size` returns a
/// page envelope, and no query returns every record.
async fn list_pokemon(State(db): State<Db>, Query(query): Query<ListQuery>) -> Response {
    let store = db.read().await;
    if let Some(name) = query.name {
        debug!(%name, "find pokemon by name");
        return match store.pokemon.values().find(|p| p.name == name) {
            Some(pokemon) => Json(pokemon.clone()).into_response(),
            None => Json(serde_json::Map::new()).into_response(),
        };
    }
    let all: Vec<Pokemon> = store.pokemon.values().cloned().collect();
    if query.page.is_some() || query.size.is_some() {
        let size = query.size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        let page = query.page.unwrap_or(0);
        return Json(PageBody::slice(all, page, size)).into_response();
    }
    Json(all).into_response()
}

async fn create_pokemon(
    State(db): State<Db>,
    Json(input): Json<PokemonInput>,
) -> (StatusCode, Json<Pokemon>) {
    let pokemon = db.write().await.insert(input);
    debug!(id = pokemon.id, "created pokemon");
    (StatusCode::CREATED, Json(pokemon))
}

async fn get_pokemon(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Pokemon>, StatusCode> {
    let store = db.read().await;
    store.pokemon.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_pokemon(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PokemonInput>,
) -> Result<Json<Pokemon>, StatusCode> {
    let mut store = db.write().await;
    let pokemon = store.pokemon.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    pokemon.name = input.name;
    pokemon.types = input.types;
    Ok(Json(pokemon.clone()))
}

async fn delete_pokemon(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .pokemon
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
