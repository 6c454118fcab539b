// FICHIER : caddie/src/optimizer/navigator.rs

use super::result::{ApiResponse, OptimizationDataSet, OptimizationResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SubstitutionMode {
    #[default]
    WithSubstitutes,
    WithoutSubstitutes,
}

impl SubstitutionMode {
    pub fn toggled(self) -> Self {
        match self {
            SubstitutionMode::WithSubstitutes => SubstitutionMode::WithoutSubstitutes,
            SubstitutionMode::WithoutSubstitutes => SubstitutionMode::WithSubstitutes,
        }
    }
}

/// Contenu d'un onglet "N magasins".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TabView<'a> {
    Plan(&'a OptimizationResult),
    /// Option absente de la réponse, ou présente sans aucun magasin.
    NoResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub max_stores: u32,
    pub total_cost: f64,
    pub savings: f64,
    pub store_names: Vec<String>,
}

impl From<&OptimizationResult> for PlanSummary {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            max_stores: result.max_stores,
            total_cost: result.total_cost,
            savings: result.savings,
            store_names: result
                .stores
                .iter()
                .map(|s| {
                    if s.store_name.is_empty() {
                        s.store_id.clone()
                    } else {
                        s.store_name.clone()
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSummary {
    pub max_stores: u32,
    pub plan: Option<PlanSummary>,
    pub highlighted: bool,
}

/// Vue de présentation pour le mode courant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigatorOverview {
    pub mode: SubstitutionMode,
    pub baseline_cost: Option<f64>,
    pub optimizable: bool,
    pub best_single_store: Option<PlanSummary>,
    pub tabs: Vec<TabSummary>,
}

/// Donne un sens à la réponse (volontairement redondante) de l'optimiseur.
///
/// Les deux arbres restent en mémoire : basculer avec/sans substituts ne
/// coûte aucun aller-retour.
#[derive(Debug, Clone)]
pub struct ResultNavigator {
    response: ApiResponse,
    mode: SubstitutionMode,
}

impl ResultNavigator {
    pub fn new(response: ApiResponse) -> Self {
        Self {
            response,
            mode: SubstitutionMode::default(),
        }
    }

    pub fn response(&self) -> &ApiResponse {
        &self.response
    }

    pub fn mode(&self) -> SubstitutionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SubstitutionMode) {
        self.mode = mode;
    }

    pub fn toggle(&mut self) -> SubstitutionMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn dataset(&self, mode: SubstitutionMode) -> Option<&OptimizationDataSet> {
        match mode {
            SubstitutionMode::WithSubstitutes => Some(&self.response.results),
            SubstitutionMode::WithoutSubstitutes => self.response.no_subs_results.as_ref(),
        }
    }

    pub fn baseline_cost(&self, mode: SubstitutionMode) -> Option<f64> {
        self.dataset(mode).map(|d| d.baseline_cost)
    }

    /// Évaluée à part : "le découpage vaut-il la peine ?", jamais comparée aux onglets.
    pub fn best_single_store(&self, mode: SubstitutionMode) -> Option<&OptimizationResult> {
        self.dataset(mode)?
            .best_single_store
            .as_ref()
            .filter(|r| r.is_usable())
    }

    /// Recommandation par défaut : la plus forte économie, à égalité le moins de magasins.
    pub fn highlighted(&self, mode: SubstitutionMode) -> Option<&OptimizationResult> {
        let mut usable: Vec<&OptimizationResult> = self
            .dataset(mode)?
            .optimization_results
            .iter()
            .filter(|r| r.is_usable())
            .collect();
        usable.sort_by_key(|r| r.max_stores);

        usable.into_iter().fold(None, |best, candidate| match best {
            Some(current) if candidate.savings <= current.savings => Some(current),
            _ => Some(candidate),
        })
    }

    pub fn tab(&self, mode: SubstitutionMode, max_stores: u32) -> TabView<'_> {
        match self.dataset(mode).and_then(|d| d.result_for(max_stores)) {
            Some(result) if result.is_usable() => TabView::Plan(result),
            _ => TabView::NoResult,
        }
    }

    /// Plafonds présents et exploitables, triés.
    pub fn available_options(&self, mode: SubstitutionMode) -> Vec<u32> {
        let mut options: Vec<u32> = self
            .dataset(mode)
            .map(|d| {
                d.optimization_results
                    .iter()
                    .filter(|r| r.is_usable())
                    .map(|r| r.max_stores)
                    .collect()
            })
            .unwrap_or_default();
        options.sort_unstable();
        options.dedup();
        options
    }

    pub fn is_optimizable(&self, mode: SubstitutionMode) -> bool {
        self.best_single_store(mode).is_some() || !self.available_options(mode).is_empty()
    }

    /// Résumé des onglets configurés pour le mode courant.
    pub fn overview(&self, options: &[u32]) -> NavigatorOverview {
        let mode = self.mode;
        let highlighted = self.highlighted(mode).map(|r| r.max_stores);

        let tabs = options
            .iter()
            .map(|&max_stores| {
                let plan = match self.tab(mode, max_stores) {
                    TabView::Plan(result) => Some(PlanSummary::from(result)),
                    TabView::NoResult => None,
                };
                TabSummary {
                    max_stores,
                    highlighted: plan.is_some() && highlighted == Some(max_stores),
                    plan,
                }
            })
            .collect();

        NavigatorOverview {
            mode,
            baseline_cost: self.baseline_cost(mode),
            optimizable: self.is_optimizable(mode),
            best_single_store: self.best_single_store(mode).map(PlanSummary::from),
            tabs,
        }
    }
}

// --- TESTS UNITAIRES ---
