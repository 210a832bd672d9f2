//! Closed enums for the event record.
//!
//! Every enum carries a `tbc` ("to be confirmed") variant that acts as the
//! unknown-value sink: scalar fields default to it, and the list sanitizer
//! substitutes it when nothing valid survives. Wire names are snake_case
//! except where the published vocabulary differs (`lgbtq+`, `fashionistas`).

use serde::{Deserialize, Serialize};

/// Coarse time-of-day bucket, used when no clock time is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    EarlyMorning,
    LateMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
    AllDay,
    Tbc,
}

impl TimeOfDay {
    pub const ALL: &'static [TimeOfDay] = &[
        TimeOfDay::EarlyMorning,
        TimeOfDay::LateMorning,
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
        TimeOfDay::AllDay,
        TimeOfDay::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::EarlyMorning => "early_morning",
            TimeOfDay::LateMorning => "late_morning",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
            TimeOfDay::AllDay => "all_day",
            TimeOfDay::Tbc => "tbc",
        }
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        TimeOfDay::Tbc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceType {
    OneOff,
    Recurring,
    CourseSession,
    SeriesPart,
    Tbc,
}

impl OccurrenceType {
    pub const ALL: &'static [OccurrenceType] = &[
        OccurrenceType::OneOff,
        OccurrenceType::Recurring,
        OccurrenceType::CourseSession,
        OccurrenceType::SeriesPart,
        OccurrenceType::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceType::OneOff => "one_off",
            OccurrenceType::Recurring => "recurring",
            OccurrenceType::CourseSession => "course_session",
            OccurrenceType::SeriesPart => "series_part",
            OccurrenceType::Tbc => "tbc",
        }
    }
}

impl Default for OccurrenceType {
    fn default() -> Self {
        OccurrenceType::Tbc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Venue,
    Online,
    AddressOnly,
    Various,
    Tbc,
}

impl LocationType {
    pub const ALL: &'static [LocationType] = &[
        LocationType::Venue,
        LocationType::Online,
        LocationType::AddressOnly,
        LocationType::Various,
        LocationType::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Venue => "venue",
            LocationType::Online => "online",
            LocationType::AddressOnly => "address_only",
            LocationType::Various => "various",
            LocationType::Tbc => "tbc",
        }
    }
}

impl Default for LocationType {
    fn default() -> Self {
        LocationType::Tbc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Required,
    Recommended,
    NotRequired,
    Tbc,
}

impl BookingType {
    pub const ALL: &'static [BookingType] = &[
        BookingType::Required,
        BookingType::Recommended,
        BookingType::NotRequired,
        BookingType::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Required => "required",
            BookingType::Recommended => "recommended",
            BookingType::NotRequired => "not_required",
            BookingType::Tbc => "tbc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Music,
    TheatreAndPerformingArts,
    ArtAndExhibitions,
    Film,
    Comedy,
    TalksAndLectures,
    WorkshopsAndClasses,
    Festivals,
    Lgbtq,
    FoodAndDrink,
    SportsAndFitness,
    SocialAndNetworking,
    FamilyAndKids,
    MarketsAndShopping,
    ToursAndTravel,
    ActivismAndCauses,
    SpiritualityAndWellness,
    TechnologyAndScience,
    BusinessAndProfessional,
    Tbc,
}

impl EventType {
    pub const ALL: &'static [EventType] = &[
        EventType::Music,
        EventType::TheatreAndPerformingArts,
        EventType::ArtAndExhibitions,
        EventType::Film,
        EventType::Comedy,
        EventType::TalksAndLectures,
        EventType::WorkshopsAndClasses,
        EventType::Festivals,
        EventType::Lgbtq,
        EventType::FoodAndDrink,
        EventType::SportsAndFitness,
        EventType::SocialAndNetworking,
        EventType::FamilyAndKids,
        EventType::MarketsAndShopping,
        EventType::ToursAndTravel,
        EventType::ActivismAndCauses,
        EventType::SpiritualityAndWellness,
        EventType::TechnologyAndScience,
        EventType::BusinessAndProfessional,
        EventType::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Music => "music",
            EventType::TheatreAndPerformingArts => "theatre_and_performing_arts",
            EventType::ArtAndExhibitions => "art_and_exhibitions",
            EventType::Film => "film",
            EventType::Comedy => "comedy",
            EventType::TalksAndLectures => "talks_and_lectures",
            EventType::WorkshopsAndClasses => "workshops_and_classes",
            EventType::Festivals => "festivals",
            EventType::Lgbtq => "lgbtq",
            EventType::FoodAndDrink => "food_and_drink",
            EventType::SportsAndFitness => "sports_and_fitness",
            EventType::SocialAndNetworking => "social_and_networking",
            EventType::FamilyAndKids => "family_and_kids",
            EventType::MarketsAndShopping => "markets_and_shopping",
            EventType::ToursAndTravel => "tours_and_travel",
            EventType::ActivismAndCauses => "activism_and_causes",
            EventType::SpiritualityAndWellness => "spirituality_and_wellness",
            EventType::TechnologyAndScience => "technology_and_science",
            EventType::BusinessAndProfessional => "business_and_professional",
            EventType::Tbc => "tbc",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == value)
    }
}

/// Audience vocabulary. Deliberately wide; invalid entries from generation
/// output are dropped by the sanitizer rather than rejected wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    All,
    Adults,
    Families,
    Kids,
    Teens,
    Students,
    YoungProfessionals,
    Seniors,
    Beginners,
    Intermediate,
    Experts,
    Couples,
    DateNight,
    Singles,
    Friends,
    SoloAttendees,
    NewInTown,
    RemoteWorkers,
    #[serde(rename = "lgbtq+")]
    LgbtqPlus,
    ArtLovers,
    Bookworms,
    FilmBuffs,
    TheatreLovers,
    MusicLovers,
    MakersCrafters,
    Photographers,
    Gamers,
    #[serde(rename = "fashionistas")]
    FashionEnthusiasts,
    HistoryBuffs,
    ComedyFans,
    Foodies,
    CoffeeAficionados,
    BeerEnthusiasts,
    WineLovers,
    Vegans,
    SportsFans,
    Runners,
    Cyclists,
    Hikers,
    Gardeners,
    Yogis,
    WellnessSeekers,
    SpiritualitySeekers,
    Religious,
    Entrepreneurs,
    TechEnthusiasts,
    Creatives,
    LanguageLearners,
    EcoConscious,
    Environmentalists,
    CharityVolunteers,
    AlternativeCulture,
    NightlifeCrowd,
    LocalCommunity,
    PetOwners,
    ActivismAndCauses,
    ParentsWithBabies,
    PreSchoolers,
    Tbc,
}

impl TargetAudience {
    pub const ALL_VALUES: &'static [TargetAudience] = &[
        TargetAudience::All,
        TargetAudience::Adults,
        TargetAudience::Families,
        TargetAudience::Kids,
        TargetAudience::Teens,
        TargetAudience::Students,
        TargetAudience::YoungProfessionals,
        TargetAudience::Seniors,
        TargetAudience::Beginners,
        TargetAudience::Intermediate,
        TargetAudience::Experts,
        TargetAudience::Couples,
        TargetAudience::DateNight,
        TargetAudience::Singles,
        TargetAudience::Friends,
        TargetAudience::SoloAttendees,
        TargetAudience::NewInTown,
        TargetAudience::RemoteWorkers,
        TargetAudience::LgbtqPlus,
        TargetAudience::ArtLovers,
        TargetAudience::Bookworms,
        TargetAudience::FilmBuffs,
        TargetAudience::TheatreLovers,
        TargetAudience::MusicLovers,
        TargetAudience::MakersCrafters,
        TargetAudience::Photographers,
        TargetAudience::Gamers,
        TargetAudience::FashionEnthusiasts,
        TargetAudience::HistoryBuffs,
        TargetAudience::ComedyFans,
        TargetAudience::Foodies,
        TargetAudience::CoffeeAficionados,
        TargetAudience::BeerEnthusiasts,
        TargetAudience::WineLovers,
        TargetAudience::Vegans,
        TargetAudience::SportsFans,
        TargetAudience::Runners,
        TargetAudience::Cyclists,
        TargetAudience::Hikers,
        TargetAudience::Gardeners,
        TargetAudience::Yogis,
        TargetAudience::WellnessSeekers,
        TargetAudience::SpiritualitySeekers,
        TargetAudience::Religious,
        TargetAudience::Entrepreneurs,
        TargetAudience::TechEnthusiasts,
        TargetAudience::Creatives,
        TargetAudience::LanguageLearners,
        TargetAudience::EcoConscious,
        TargetAudience::Environmentalists,
        TargetAudience::CharityVolunteers,
        TargetAudience::AlternativeCulture,
        TargetAudience::NightlifeCrowd,
        TargetAudience::LocalCommunity,
        TargetAudience::PetOwners,
        TargetAudience::ActivismAndCauses,
        TargetAudience::ParentsWithBabies,
        TargetAudience::PreSchoolers,
        TargetAudience::Tbc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetAudience::All => "all",
            TargetAudience::Adults => "adults",
            TargetAudience::Families => "families",
            TargetAudience::Kids => "kids",
            TargetAudience::Teens => "teens",
            TargetAudience::Students => "students",
            TargetAudience::YoungProfessionals => "young_professionals",
            TargetAudience::Seniors => "seniors",
            TargetAudience::Beginners => "beginners",
            TargetAudience::Intermediate => "intermediate",
            TargetAudience::Experts => "experts",
            TargetAudience::Couples => "couples",
            TargetAudience::DateNight => "date_night",
            TargetAudience::Singles => "singles",
            TargetAudience::Friends => "friends",
            TargetAudience::SoloAttendees => "solo_attendees",
            TargetAudience::NewInTown => "new_in_town",
            TargetAudience::RemoteWorkers => "remote_workers",
            TargetAudience::LgbtqPlus => "lgbtq+",
            TargetAudience::ArtLovers => "art_lovers",
            TargetAudience::Bookworms => "bookworms",
            TargetAudience::FilmBuffs => "film_buffs",
            TargetAudience::TheatreLovers => "theatre_lovers",
            TargetAudience::MusicLovers => "music_lovers",
            TargetAudience::MakersCrafters => "makers_crafters",
            TargetAudience::Photographers => "photographers",
            TargetAudience::Gamers => "gamers",
            TargetAudience::FashionEnthusiasts => "fashionistas",
            TargetAudience::HistoryBuffs => "history_buffs",
            TargetAudience::ComedyFans => "comedy_fans",
            TargetAudience::Foodies => "foodies",
            TargetAudience::CoffeeAficionados => "coffee_aficionados",
            TargetAudience::BeerEnthusiasts => "beer_enthusiasts",
            TargetAudience::WineLovers => "wine_lovers",
            TargetAudience::Vegans => "vegans",
            TargetAudience::SportsFans => "sports_fans",
            TargetAudience::Runners => "runners",
            TargetAudience::Cyclists => "cyclists",
            TargetAudience::Hikers => "hikers",
            TargetAudience::Gardeners => "gardeners",
            TargetAudience::Yogis => "yogis",
            TargetAudience::WellnessSeekers => "wellness_seekers",
            TargetAudience::SpiritualitySeekers => "spirituality_seekers",
            TargetAudience::Religious => "religious",
            TargetAudience::Entrepreneurs => "entrepreneurs",
            TargetAudience::TechEnthusiasts => "tech_enthusiasts",
            TargetAudience::Creatives => "creatives",
            TargetAudience::LanguageLearners => "language_learners",
            TargetAudience::EcoConscious => "eco_conscious",
            TargetAudience::Environmentalists => "environmentalists",
            TargetAudience::CharityVolunteers => "charity_volunteers",
            TargetAudience::AlternativeCulture => "alternative_culture",
            TargetAudience::NightlifeCrowd => "nightlife_crowd",
            TargetAudience::LocalCommunity => "local_community",
            TargetAudience::PetOwners => "pet_owners",
            TargetAudience::ActivismAndCauses => "activism_and_causes",
            TargetAudience::ParentsWithBabies => "parents_with_babies",
            TargetAudience::PreSchoolers => "pre_schoolers",
            TargetAudience::Tbc => "tbc",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL_VALUES.iter().copied().find(|v| v.as_str() == value)
    }
}

/// Renders an enum vocabulary as a comma-separated listing for prompts.
pub fn join_values<T>(values: &[T], as_str: impl Fn(&T) -> &'static str) -> String {
    values.iter().map(as_str).collect::<Vec<_>>().join(", ")
}
